//! Combat and vitals constants.

/// Default attack rating (damage per level before mitigation)
pub const BASE_ATTACK_RATING: i32 = 2;
/// Default health rating (health per level)
pub const BASE_HEALTH_RATING: i32 = 10;
/// Default armor rating (mitigation per level, halved on hit)
pub const BASE_ARMOR_RATING: i32 = 1;

/// Health restored per regeneration event
pub const REGEN_AMOUNT: f64 = 1.0;
/// Ticks between regeneration events
pub const REGEN_INTERVAL: u64 = 300;
