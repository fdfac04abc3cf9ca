//! Combat system functions.

use hecs::Entity;
use tracing::{debug, info};

use crate::components::{Mob, Vitals};
use crate::events::GameEvent;
use crate::grid;
use crate::queries;
use crate::systems::actions;
use crate::systems::experience::{grant_experience, mob_experience};
use crate::zone::{Zone, ZoneScheduler};

/// Damage one hit deals: attack minus half the armor, never negative.
pub fn damage(attacker: &Vitals, defender: &Vitals) -> f64 {
    (attacker.attack() - defender.armor() / 2.0).max(0.0)
}

/// Whether `attacker` can currently reach `target`. Players only hit what
/// they are facing; mobs hit anything orthogonally adjacent.
pub fn can_hit(zone: &Zone, attacker: Entity, target: Entity) -> bool {
    if queries::is_player(zone.world(), attacker) {
        return actions::faced_target(zone, attacker) == Some(target);
    }
    match (zone.position(attacker), zone.position(target)) {
        (Some(a), Some(t)) => grid::is_adjacent(a, t),
        _ => false,
    }
}

/// Land a hit, if both sides are still alive and next to each other.
/// Returns the damage dealt.
pub fn resolve_attack(
    zone: &mut Zone,
    sched: &mut ZoneScheduler,
    attacker: Entity,
    target: Entity,
) -> Option<f64> {
    if zone.is_dead(attacker) || zone.is_dead(target) {
        return None;
    }
    let (Some(a), Some(t)) = (zone.position(attacker), zone.position(target)) else {
        return None;
    };
    let world = zone.world();
    let attacker_name = queries::display_name(world, attacker);
    let target_name = queries::display_name(world, target);
    if !grid::is_adjacent(a, t) {
        zone.events
            .message(format!("{attacker_name} swings at {target_name} and misses"));
        return None;
    }

    let dealt = {
        let world = zone.world();
        let (Ok(atk), Ok(def)) = (world.get::<&Vitals>(attacker), world.get::<&Vitals>(target))
        else {
            return None;
        };
        damage(&atk, &def)
    };

    debug!(?attacker, ?target, damage = dealt, "attack");
    zone.events.push(GameEvent::AttackHit {
        attacker,
        target,
        damage: dealt,
    });
    zone.events.message(format!(
        "{attacker_name} hits {target_name} for {dealt:.1} damage"
    ));
    take_damage(zone, sched, target, Some(attacker), dealt);
    Some(dealt)
}

/// Apply damage. Mobs remember who hurt them; anything brought below one
/// health point dies.
pub fn take_damage(
    zone: &mut Zone,
    sched: &mut ZoneScheduler,
    target: Entity,
    source: Option<Entity>,
    amount: f64,
) {
    let dead = {
        let Ok(mut vitals) = zone.world().get::<&mut Vitals>(target) else {
            return;
        };
        vitals.damage_taken += amount;
        vitals.is_dead()
    };

    if let Some(source) = source {
        if let Ok(mut mob) = zone.world().get::<&mut Mob>(target) {
            mob.threat.add(source, amount);
        }
    }

    if dead {
        die(zone, sched, target, source);
    }
}

/// Handle death.
///
/// A dead player stays in the zone and raises the shutdown signal. A dead
/// mob loses every scheduled action, leaves the zone, and pays experience
/// to a player killer.
pub fn die(zone: &mut Zone, sched: &mut ZoneScheduler, entity: Entity, killer: Option<Entity>) {
    let name = queries::display_name(zone.world(), entity);
    sched.cancel_owned_by(entity);

    if queries::is_player(zone.world(), entity) {
        info!(?entity, "player died");
        zone.events.push(GameEvent::PlayerDied { entity });
        zone.events.message(format!("{name} has died"));
        zone.request_shutdown();
        return;
    }

    let level = queries::level(zone.world(), entity).unwrap_or(0);
    zone.remove_spawn(entity);
    info!(?entity, level, "mob died");
    zone.events.push(GameEvent::EntityDied { entity });
    zone.events.message(format!("{name} dies"));

    if let Some(killer) = killer {
        if queries::is_player(zone.world(), killer) {
            grant_experience(zone, killer, mob_experience(level));
        }
    }
}

/// Heal up to the configured regeneration amount, never past full health.
/// Returns the amount healed.
pub fn regenerate(zone: &mut Zone, entity: Entity) -> f64 {
    let amount = zone.config().regen_amount;
    let Ok(mut vitals) = zone.world().get::<&mut Vitals>(entity) else {
        return 0.0;
    };
    if vitals.is_dead() {
        return 0.0;
    }
    let healed = amount.min(vitals.damage_taken);
    vitals.damage_taken -= healed;
    healed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Avatar, Facing, Direction, PendingActions, Player, Position};
    use crate::config::SimConfig;
    use crate::grid::Grid;

    fn zone() -> (Zone, ZoneScheduler) {
        let config = SimConfig {
            seed: Some(3),
            ..SimConfig::default()
        };
        let sched = ZoneScheduler::from_config(&config);
        let zone = Zone::with_grid(config, Grid::new(5, 5)).unwrap();
        (zone, sched)
    }

    fn spawn_player(zone: &mut Zone, row: i32, col: i32, level: u32) -> Entity {
        let entity = zone.world_mut().spawn((
            Position::new(row, col),
            Vitals::new(level),
            Player::default(),
            Facing(Direction::Right),
            Avatar('@'),
            PendingActions::new(),
        ));
        zone.add_spawn(entity).unwrap();
        zone.set_player(entity).unwrap();
        entity
    }

    fn spawn_mob(zone: &mut Zone, row: i32, col: i32, level: u32) -> Entity {
        let entity = zone.world_mut().spawn((
            Position::new(row, col),
            Vitals::new(level),
            Mob::new(Position::new(row, col)),
            Avatar('r'),
            PendingActions::new(),
        ));
        zone.add_spawn(entity).unwrap();
        entity
    }

    #[test]
    fn test_damage_formula() {
        assert_eq!(damage(&Vitals::new(1), &Vitals::new(1)), 1.5);
        assert_eq!(damage(&Vitals::new(2), &Vitals::new(1)), 3.5);

        let mut tank = Vitals::new(1);
        tank.armor_rating = 10;
        assert_eq!(damage(&Vitals::new(1), &tank), 0.0);
    }

    #[test]
    fn test_mob_hit_builds_threat() {
        let (mut zone, mut sched) = zone();
        let player = spawn_player(&mut zone, 2, 1, 1);
        let mob = spawn_mob(&mut zone, 2, 2, 1);

        let dealt = resolve_attack(&mut zone, &mut sched, player, mob);
        assert_eq!(dealt, Some(1.5));
        let mob_ref = zone.world().get::<&Mob>(mob).unwrap();
        assert_eq!(mob_ref.threat.get(player), Some(1.5));
    }

    #[test]
    fn test_attack_out_of_reach_misses() {
        let (mut zone, mut sched) = zone();
        let player = spawn_player(&mut zone, 0, 0, 1);
        let mob = spawn_mob(&mut zone, 3, 3, 1);
        assert_eq!(resolve_attack(&mut zone, &mut sched, player, mob), None);
        assert_eq!(queries::health_remaining(zone.world(), mob), Some(10.0));
    }

    #[test]
    fn test_can_hit_uses_facing_for_players() {
        let (mut zone, _) = zone();
        let player = spawn_player(&mut zone, 2, 2, 1);
        let right = spawn_mob(&mut zone, 2, 3, 1);
        let below = spawn_mob(&mut zone, 3, 2, 1);

        assert!(can_hit(&zone, player, right));
        assert!(!can_hit(&zone, player, below));
        // Mobs ignore facing
        assert!(can_hit(&zone, below, player));
        assert!(!can_hit(&zone, right, below));
    }

    #[test]
    fn test_mob_death_pays_player_and_leaves_zone() {
        let (mut zone, mut sched) = zone();
        let player = spawn_player(&mut zone, 2, 1, 1);
        let mob = spawn_mob(&mut zone, 2, 2, 3);
        sched.schedule_repeating_for(mob, 1, |_: &mut Zone, _: &mut ZoneScheduler| {}, None);

        take_damage(&mut zone, &mut sched, mob, Some(player), 30.0);

        assert!(!zone.world().contains(mob));
        assert!(!zone.is_occupied(2, 2));
        assert_eq!(sched.pending_for(mob), 0);
        assert_eq!(queries::experience(zone.world(), player), Some(15));
        assert_eq!(queries::level(zone.world(), player), Some(2));
        assert!(zone.check_invariant());
    }

    #[test]
    fn test_mob_killed_by_mob_pays_nothing() {
        let (mut zone, mut sched) = zone();
        let player = spawn_player(&mut zone, 0, 0, 1);
        let killer = spawn_mob(&mut zone, 2, 1, 1);
        let victim = spawn_mob(&mut zone, 2, 2, 1);

        take_damage(&mut zone, &mut sched, victim, Some(killer), 10.0);
        assert!(!zone.world().contains(victim));
        assert_eq!(queries::experience(zone.world(), player), Some(0));
    }

    #[test]
    fn test_player_death_signals_shutdown() {
        let (mut zone, mut sched) = zone();
        let player = spawn_player(&mut zone, 2, 2, 1);
        let mob = spawn_mob(&mut zone, 2, 3, 1);

        take_damage(&mut zone, &mut sched, player, Some(mob), 9.5);

        assert!(zone.shutdown_requested());
        assert!(zone.world().contains(player));
        assert_eq!(zone.position(player), Some((2, 2)));
        assert!(zone
            .events
            .pending()
            .contains(&GameEvent::PlayerDied { entity: player }));
    }

    #[test]
    fn test_regenerate_caps_at_damage_taken() {
        let (mut zone, _) = zone();
        let player = spawn_player(&mut zone, 2, 2, 1);
        zone.world().get::<&mut Vitals>(player).unwrap().damage_taken = 1.5;

        assert_eq!(regenerate(&mut zone, player), 1.0);
        assert_eq!(regenerate(&mut zone, player), 0.5);
        assert_eq!(regenerate(&mut zone, player), 0.0);
        assert_eq!(queries::health_remaining(zone.world(), player), Some(10.0));
    }
}
