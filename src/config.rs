//! Runtime-tunable simulation parameters.
//!
//! Defaults come from [`crate::constants`]; any subset of fields may be
//! overridden from JSON, missing fields keep their default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Result, SimError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // ===== scheduler =====
    /// Ticks per wall-clock second when running in real time.
    pub target_tick_rate: f64,
    pub overrun_tolerance_ms: u64,

    // ===== zone =====
    pub rows: usize,
    pub cols: usize,
    pub route_radius: i32,
    /// Seed for the zone RNG; `None` draws from entropy.
    pub seed: Option<u64>,

    // ===== action delays (ticks) =====
    pub move_delay: u64,
    pub attack_delay: u64,
    pub wander_delay: u64,

    // ===== regeneration =====
    pub regen_amount: f64,
    pub regen_interval: u64,

    // ===== mob AI =====
    pub scan_radius: i32,
    pub baseline_threat: f64,
    pub forget_distance: f64,
    pub forget_factor: f64,
    pub purge_distance: f64,
    pub min_threat: f64,
    pub flee_fraction: f64,
}

impl SimConfig {
    pub fn new() -> Self {
        Self {
            target_tick_rate: TARGET_TICK_RATE,
            overrun_tolerance_ms: OVERRUN_TOLERANCE_MS,
            rows: ZONE_DEFAULT_ROWS,
            cols: ZONE_DEFAULT_COLS,
            route_radius: ROUTE_RADIUS,
            seed: None,
            move_delay: MOVE_DELAY,
            attack_delay: ATTACK_DELAY,
            wander_delay: WANDER_DELAY,
            regen_amount: REGEN_AMOUNT,
            regen_interval: REGEN_INTERVAL,
            scan_radius: KOS_SCAN_RADIUS,
            baseline_threat: BASELINE_THREAT,
            forget_distance: THREAT_FORGET_DISTANCE,
            forget_factor: THREAT_FORGET_FACTOR,
            purge_distance: THREAT_PURGE_DISTANCE,
            min_threat: MIN_THREAT,
            flee_fraction: FLEE_HEALTH_FRACTION,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(SimError::InvalidConfig(format!(
                "zone must have at least one cell, got {}x{}",
                self.rows, self.cols
            )));
        }
        if !(self.target_tick_rate > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "target_tick_rate must be positive, got {}",
                self.target_tick_rate
            )));
        }
        if self.route_radius < 1 {
            return Err(SimError::InvalidConfig(format!(
                "route_radius must be at least 1, got {}",
                self.route_radius
            )));
        }
        if self.regen_interval == 0 {
            return Err(SimError::InvalidConfig(
                "regen_interval must be at least one tick".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_tick_rate)
    }

    pub fn overrun_tolerance(&self) -> Duration {
        Duration::from_millis(self.overrun_tolerance_ms)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}
