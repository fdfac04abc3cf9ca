//! Tick-driven grid simulation: a player and autonomous mobs on a 2D grid,
//! driven by a discrete event scheduler with threat-based AI and bounded
//! shortest-path routing.

pub mod components;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod grid;
pub mod pathfinding;
pub mod queries;
pub mod spatial_cache;
pub mod spawning;
pub mod systems;
pub mod time_system;
pub mod zone;

pub use config::SimConfig;
pub use engine::GameEngine;
pub use error::{Result, SimError};
pub use events::GameEvent;
pub use grid::{Cell, Grid, Terrain};
pub use spawning::{MobDef, PlayerDef};
pub use systems::PlayerCommand;
pub use time_system::{EventScheduler, TaskHandle, Tick};
pub use zone::{Zone, ZoneScheduler};
