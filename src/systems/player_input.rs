//! Player command interpretation.
//!
//! Hosts translate whatever input they have into a [`PlayerCommand`]; this
//! module turns commands into debounced actions on the player entity.

use hecs::Entity;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::Direction;
use crate::systems::{actions, experience};
use crate::zone::{Zone, ZoneScheduler};

/// Something the player asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerCommand {
    /// Turn and step one cell
    Move(Direction),
    /// Attack whatever stands in the faced cell
    Attack,
}

/// Apply a command to `player`. Returns false if it was refused (dead
/// player, debounced, or nothing to attack).
pub fn apply_command(
    zone: &mut Zone,
    sched: &mut ZoneScheduler,
    player: Entity,
    command: PlayerCommand,
) -> bool {
    if zone.is_dead(player) {
        return false;
    }
    let accepted = match command {
        PlayerCommand::Move(direction) => actions::move_cardinal(zone, sched, player, direction),
        PlayerCommand::Attack => actions::attack(zone, sched, player, None),
    };
    debug!(?command, accepted, "player command");
    accepted
}

/// Per-tick player bookkeeping.
pub fn player_tick(zone: &mut Zone, _sched: &mut ZoneScheduler, player: Entity) {
    experience::check_level_up(zone, player);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Avatar, Facing, Mob, PendingActions, Player, Position, Vitals};
    use crate::config::SimConfig;
    use crate::grid::Grid;
    use crate::queries;

    fn setup() -> (Zone, ZoneScheduler, Entity) {
        let config = SimConfig::default();
        let sched = ZoneScheduler::from_config(&config);
        let mut zone = Zone::with_grid(config, Grid::new(4, 4)).unwrap();
        let player = zone.world_mut().spawn((
            Position::new(1, 1),
            Vitals::new(1),
            Player::default(),
            Facing::default(),
            Avatar('@'),
            PendingActions::new(),
        ));
        zone.add_spawn(player).unwrap();
        zone.set_player(player).unwrap();
        (zone, sched, player)
    }

    #[test]
    fn test_move_command() {
        let (mut zone, mut sched, player) = setup();
        assert!(apply_command(&mut zone, &mut sched, player, PlayerCommand::Move(Direction::Down)));
        sched.advance(5, &mut zone);
        assert_eq!(zone.position(player), Some((2, 1)));
        assert_eq!(queries::facing(zone.world(), player), Some(Direction::Down));
    }

    #[test]
    fn test_attack_command_needs_target() {
        let (mut zone, mut sched, player) = setup();
        assert!(!apply_command(&mut zone, &mut sched, player, PlayerCommand::Attack));

        let mob = zone.world_mut().spawn((
            Position::new(1, 2),
            Vitals::new(1),
            Mob::new(Position::new(1, 2)),
            PendingActions::new(),
        ));
        zone.add_spawn(mob).unwrap();
        assert!(apply_command(&mut zone, &mut sched, player, PlayerCommand::Attack));
    }

    #[test]
    fn test_dead_player_commands_are_refused() {
        let (mut zone, mut sched, player) = setup();
        zone.world().get::<&mut Vitals>(player).unwrap().damage_taken = 10.0;
        assert!(!apply_command(&mut zone, &mut sched, player, PlayerCommand::Move(Direction::Up)));
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn test_player_tick_levels_up() {
        let (mut zone, mut sched, player) = setup();
        zone.world().get::<&mut Player>(player).unwrap().experience = 15;
        player_tick(&mut zone, &mut sched, player);
        assert_eq!(queries::level(zone.world(), player), Some(2));
    }

    #[test]
    fn test_command_json_shape() {
        let command: PlayerCommand = serde_json::from_str(r#"{"Move":"Left"}"#).unwrap();
        assert_eq!(command, PlayerCommand::Move(Direction::Left));
    }
}
