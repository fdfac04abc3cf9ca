//! Common entity query helpers.
//!
//! Pure read-only queries over the zone's world. Nothing here mutates state,
//! so they are safe to call from renderers and hosts between scheduler passes.

use hecs::{Entity, World};
use serde::Serialize;

use crate::components::{Avatar, Direction, Facing, Mob, Player, Position, Vitals};
use crate::systems::experience;

/// Check if an entity is dead. Entities without vitals, including ones that
/// have been despawned, count as dead.
pub fn is_entity_dead(world: &World, entity: Entity) -> bool {
    world
        .get::<&Vitals>(entity)
        .map(|v| v.is_dead())
        .unwrap_or(true)
}

/// Get an entity's logical position as a tuple.
pub fn get_entity_position(world: &World, entity: Entity) -> Option<(i32, i32)> {
    world.get::<&Position>(entity).ok().map(|p| p.cell())
}

pub fn is_player(world: &World, entity: Entity) -> bool {
    world.get::<&Player>(entity).is_ok()
}

pub fn is_mob(world: &World, entity: Entity) -> bool {
    world.get::<&Mob>(entity).is_ok()
}

pub fn level(world: &World, entity: Entity) -> Option<u32> {
    world.get::<&Vitals>(entity).ok().map(|v| v.level)
}

pub fn health_remaining(world: &World, entity: Entity) -> Option<f64> {
    world.get::<&Vitals>(entity).ok().map(|v| v.health_remaining())
}

pub fn health_total(world: &World, entity: Entity) -> Option<f64> {
    world.get::<&Vitals>(entity).ok().map(|v| v.health_total())
}

pub fn experience(world: &World, entity: Entity) -> Option<u32> {
    world.get::<&Player>(entity).ok().map(|p| p.experience)
}

pub fn facing(world: &World, entity: Entity) -> Option<Direction> {
    world.get::<&Facing>(entity).ok().map(|f| f.0)
}

pub fn avatar(world: &World, entity: Entity) -> Option<char> {
    world.get::<&Avatar>(entity).ok().map(|a| a.0)
}

/// Display name used in messages: the avatar glyph, or `?`.
pub fn display_name(world: &World, entity: Entity) -> char {
    avatar(world, entity).unwrap_or('?')
}

/// Relative difficulty of `other` as seen by `viewer`.
pub fn con(world: &World, viewer: Entity, other: Entity) -> Option<f64> {
    Some(experience::con(level(world, viewer)?, level(world, other)?))
}

/// Everything a status panel shows about the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStatus {
    pub level: u32,
    pub experience: u32,
    pub experience_needed: f64,
    pub health_remaining: f64,
    pub health_total: f64,
    pub position: Option<(i32, i32)>,
}

pub fn player_status(world: &World, player: Entity) -> Option<PlayerStatus> {
    let vitals = *world.get::<&Vitals>(player).ok()?;
    let experience = world.get::<&Player>(player).ok()?.experience;
    Some(PlayerStatus {
        level: vitals.level,
        experience,
        experience_needed: experience::experience_needed(vitals.level),
        health_remaining: vitals.health_remaining(),
        health_total: vitals.health_total(),
        position: get_entity_position(world, player),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entity_counts_as_dead() {
        let mut world = World::new();
        let entity = world.spawn((Vitals::new(1),));
        assert!(!is_entity_dead(&world, entity));
        world.despawn(entity).unwrap();
        assert!(is_entity_dead(&world, entity));
    }

    #[test]
    fn test_player_status_snapshot() {
        let mut world = World::new();
        let mut vitals = Vitals::new(2);
        vitals.damage_taken = 5.0;
        let player = world.spawn((
            Position::new(3, 4),
            vitals,
            Player { experience: 20 },
        ));

        let status = player_status(&world, player).unwrap();
        assert_eq!(status.level, 2);
        assert_eq!(status.experience, 20);
        assert_eq!(status.experience_needed, 48.0);
        assert_eq!(status.health_remaining, 15.0);
        assert_eq!(status.health_total, 20.0);
        assert_eq!(status.position, Some((3, 4)));
    }

    #[test]
    fn test_player_status_requires_player() {
        let mut world = World::new();
        let mob = world.spawn((Vitals::new(1),));
        assert_eq!(player_status(&world, mob), None);
    }

    #[test]
    fn test_con_between_entities() {
        let mut world = World::new();
        let player = world.spawn((Vitals::new(2),));
        let equal = world.spawn((Vitals::new(2),));
        let higher = world.spawn((Vitals::new(4),));
        assert_eq!(con(&world, player, equal), Some(0.0));
        assert_eq!(con(&world, player, higher), Some(0.5));
        assert_eq!(display_name(&world, higher), '?');
    }
}
