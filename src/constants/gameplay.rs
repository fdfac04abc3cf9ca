//! Core gameplay constants (levels, experience).

/// Level every entity starts at
pub const STARTING_LEVEL: u32 = 1;
/// Experience a mob is worth per level when killed by a player
pub const MOB_EXP_PER_LEVEL: u32 = 5;
/// Additive term of the level-up threshold curve
pub const EXP_CURVE_OFFSET: f64 = 14.0;
