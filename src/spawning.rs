//! Data-driven entity spawning.
//!
//! A definition carries everything needed to put a player or mob into a
//! zone. Spawning places the entity and starts its two repeating tasks, the
//! per-tick update and regeneration, both owned by the entity and stopped as
//! soon as it is dead.

use hecs::Entity;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::{Avatar, Facing, Mob, Mobility, PendingActions, Player, Position, Vitals};
use crate::constants::*;
use crate::error::Result;
use crate::systems::{ai, combat, player_input};
use crate::zone::{Zone, ZoneScheduler};

/// Definition of a player character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerDef {
    pub avatar: char,
    pub level: u32,
    pub attack_rating: i32,
    pub health_rating: i32,
    pub armor_rating: i32,
}

impl Default for PlayerDef {
    fn default() -> Self {
        Self {
            avatar: '@',
            level: STARTING_LEVEL,
            attack_rating: BASE_ATTACK_RATING,
            health_rating: BASE_HEALTH_RATING,
            armor_rating: BASE_ARMOR_RATING,
        }
    }
}

impl PlayerDef {
    /// Spawn the player at `(row, col)`. Does not designate it; see
    /// [`Zone::set_player`].
    pub fn spawn(
        &self,
        zone: &mut Zone,
        sched: &mut ZoneScheduler,
        row: i32,
        col: i32,
    ) -> Result<Entity> {
        let entity = zone.world_mut().spawn((
            Position::new(row, col),
            vitals(self.level, self.attack_rating, self.health_rating, self.armor_rating),
            Player::default(),
            Facing::default(),
            Avatar(self.avatar),
            PendingActions::new(),
        ));
        place_or_despawn(zone, entity)?;
        start_ticking(sched, entity, player_input::player_tick);
        start_regeneration(zone, sched, entity);
        debug!(?entity, row, col, "spawned player");
        Ok(entity)
    }
}

/// Definition of a mob type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobDef {
    pub avatar: char,
    pub level: u32,
    pub attack_rating: i32,
    pub health_rating: i32,
    pub armor_rating: i32,
    /// Attack players on sight
    pub kos: bool,
    /// Run when badly hurt
    pub flees: bool,
    pub mobility: Mobility,
    pub wander_radius: i32,
}

impl Default for MobDef {
    fn default() -> Self {
        Self {
            avatar: 'm',
            level: STARTING_LEVEL,
            attack_rating: BASE_ATTACK_RATING,
            health_rating: BASE_HEALTH_RATING,
            armor_rating: BASE_ARMOR_RATING,
            kos: true,
            flees: false,
            mobility: Mobility::Wander,
            wander_radius: DEFAULT_WANDER_RADIUS,
        }
    }
}

impl MobDef {
    pub fn with_avatar(avatar: char) -> Self {
        Self {
            avatar,
            ..Self::default()
        }
    }

    /// Spawn this mob at `(row, col)`, which also becomes its spawn point.
    pub fn spawn(
        &self,
        zone: &mut Zone,
        sched: &mut ZoneScheduler,
        row: i32,
        col: i32,
    ) -> Result<Entity> {
        let spawn_point = Position::new(row, col);
        let mob = Mob {
            kos: self.kos,
            flees: self.flees,
            mobility: self.mobility,
            wander_radius: self.wander_radius,
            ..Mob::new(spawn_point)
        };
        let entity = zone.world_mut().spawn((
            spawn_point,
            vitals(self.level, self.attack_rating, self.health_rating, self.armor_rating),
            mob,
            Facing::default(),
            Avatar(self.avatar),
            PendingActions::new(),
        ));
        place_or_despawn(zone, entity)?;
        start_ticking(sched, entity, ai::mob_tick);
        start_regeneration(zone, sched, entity);
        debug!(?entity, row, col, avatar = %self.avatar, "spawned mob");
        Ok(entity)
    }
}

fn vitals(level: u32, attack_rating: i32, health_rating: i32, armor_rating: i32) -> Vitals {
    Vitals {
        level,
        attack_rating,
        health_rating,
        armor_rating,
        damage_taken: 0.0,
    }
}

fn place_or_despawn(zone: &mut Zone, entity: Entity) -> Result<()> {
    if let Err(err) = zone.add_spawn(entity) {
        let _ = zone.world_mut().despawn(entity);
        return Err(err);
    }
    Ok(())
}

/// Run `tick` for `entity` every tick until it dies.
fn start_ticking(
    sched: &mut ZoneScheduler,
    entity: Entity,
    tick: fn(&mut Zone, &mut ZoneScheduler, Entity),
) {
    sched.schedule_repeating_for(
        entity,
        TICK_INTERVAL,
        move |zone: &mut Zone, sched: &mut ZoneScheduler| tick(zone, sched, entity),
        Some(Box::new(move |zone: &Zone| zone.is_dead(entity))),
    );
}

/// Heal `entity` on the configured cadence until it dies.
fn start_regeneration(zone: &Zone, sched: &mut ZoneScheduler, entity: Entity) {
    sched.schedule_repeating_for(
        entity,
        zone.config().regen_interval,
        move |zone: &mut Zone, _: &mut ZoneScheduler| {
            combat::regenerate(zone, entity);
        },
        Some(Box::new(move |zone: &Zone| zone.is_dead(entity))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::error::SimError;
    use crate::grid::Grid;
    use crate::queries;

    fn setup() -> (Zone, ZoneScheduler) {
        let config = SimConfig {
            seed: Some(2),
            ..SimConfig::default()
        };
        let sched = ZoneScheduler::from_config(&config);
        let grid = Grid::from_ascii(&["....", ".#..", "...."]).unwrap();
        let zone = Zone::with_grid(config, grid).unwrap();
        (zone, sched)
    }

    #[test]
    fn test_spawn_mob_registers_tasks() {
        let (mut zone, mut sched) = setup();
        let mob = MobDef::with_avatar('r').spawn(&mut zone, &mut sched, 0, 0).unwrap();

        assert_eq!(zone.position(mob), Some((0, 0)));
        assert_eq!(queries::avatar(zone.world(), mob), Some('r'));
        assert_eq!(sched.pending_for(mob), 2);
        assert!(zone.check_invariant());
    }

    #[test]
    fn test_spawn_on_terrain_fails_cleanly() {
        let (mut zone, mut sched) = setup();
        let err = MobDef::default().spawn(&mut zone, &mut sched, 1, 1);
        assert!(matches!(err, Err(SimError::Occupied { row: 1, col: 1 })));
        assert_eq!(zone.world().len(), 0);
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn test_spawn_player_uses_definition() {
        let (mut zone, mut sched) = setup();
        let def = PlayerDef {
            level: 2,
            ..PlayerDef::default()
        };
        let player = def.spawn(&mut zone, &mut sched, 2, 3).unwrap();
        assert_eq!(queries::health_total(zone.world(), player), Some(20.0));
        assert_eq!(queries::experience(zone.world(), player), Some(0));
        zone.set_player(player).unwrap();
    }

    #[test]
    fn test_regeneration_runs_on_cadence() {
        let (mut zone, mut sched) = setup();
        let player = PlayerDef::default().spawn(&mut zone, &mut sched, 2, 3).unwrap();
        zone.world().get::<&mut Vitals>(player).unwrap().damage_taken = 3.0;

        sched.advance(299, &mut zone);
        assert_eq!(queries::health_remaining(zone.world(), player), Some(7.0));
        sched.advance(1, &mut zone);
        assert_eq!(queries::health_remaining(zone.world(), player), Some(8.0));
    }

    #[test]
    fn test_ticks_stop_once_dead() {
        let (mut zone, mut sched) = setup();
        let player = PlayerDef::default().spawn(&mut zone, &mut sched, 2, 3).unwrap();
        zone.world().get::<&mut Vitals>(player).unwrap().damage_taken = 10.0;

        sched.advance(1, &mut zone);
        // The per-tick task notices and stops; regeneration stops on its next run
        assert_eq!(sched.pending_for(player), 1);
        sched.advance(300, &mut zone);
        assert_eq!(sched.pending_for(player), 0);
    }

    #[test]
    fn test_mob_def_from_json() {
        let def: MobDef = serde_json::from_str(r#"{"avatar": "k", "flees": true}"#).unwrap();
        assert_eq!(def.avatar, 'k');
        assert!(def.flees);
        assert!(def.kos);
        assert_eq!(def.level, 1);
    }
}
