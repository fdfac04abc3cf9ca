//! Simulation constants organized by domain.
//!
//! Centralizing magic numbers makes tuning easier and documents intent.
//! Every value here is a default; `SimConfig` can override the tunable ones.

mod combat;
mod enemies;
mod gameplay;
mod time;
mod zone;

pub use combat::*;
pub use enemies::*;
pub use gameplay::*;
pub use time::*;
pub use zone::*;
