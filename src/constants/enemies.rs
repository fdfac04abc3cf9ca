//! Mob behavior constants.

/// Radius scanned by kill-on-sight mobs looking for players
pub const KOS_SCAN_RADIUS: i32 = 3;
/// Threat seeded for a player spotted by a kill-on-sight scan
pub const BASELINE_THREAT: f64 = 2.0;
/// Beyond this distance threat starts to decay
pub const THREAT_FORGET_DISTANCE: f64 = 5.0;
/// Per-tick multiplier applied to distant threat
pub const THREAT_FORGET_FACTOR: f64 = 0.99;
/// Beyond this distance a threat entry is dropped outright
pub const THREAT_PURGE_DISTANCE: f64 = 20.0;
/// Threat below this is dropped
pub const MIN_THREAT: f64 = 1.0;
/// Fraction of total health at or below which a fleeing mob runs
pub const FLEE_HEALTH_FRACTION: f64 = 0.10;
/// Default distance a mob roams from its spawn point
pub const DEFAULT_WANDER_RADIUS: i32 = 10;
