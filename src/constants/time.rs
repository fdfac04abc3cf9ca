//! Scheduler and action timing constants. All durations are in ticks.

/// Ticks dispatched per wall-clock second
pub const TARGET_TICK_RATE: f64 = 60.0;
/// How late (milliseconds) an action may fire before a warning is logged
pub const OVERRUN_TOLERANCE_MS: u64 = 100;

/// Ticks between a move request and the move itself
pub const MOVE_DELAY: u64 = 5;
/// Ticks between an attack request and the hit landing
pub const ATTACK_DELAY: u64 = 30;
/// Ticks an idle mob lingers before taking its wander step
pub const WANDER_DELAY: u64 = 60;
/// Interval of the per-entity decision tick
pub const TICK_INTERVAL: u64 = 1;
