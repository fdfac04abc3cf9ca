//! Simulation systems organized by domain.
//!
//! - `actions`: Debounced action requests (move, attack, wander)
//! - `ai`: Mob decision-making and threat bookkeeping
//! - `combat`: Damage, death and regeneration
//! - `experience`: Experience, leveling and con ratings
//! - `player_input`: Player commands and the per-tick player update

pub mod actions;
pub mod ai;
pub mod combat;
pub mod experience;
pub mod player_input;

// Re-export commonly used items
pub use actions::{attack, move_cardinal, move_to};
pub use ai::mob_tick;
pub use combat::{damage, take_damage};
pub use experience::{experience_needed, grant_experience};
pub use player_input::{apply_command, PlayerCommand};
