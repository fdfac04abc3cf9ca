//! Mob decision-making.
//!
//! Every mob runs [`mob_tick`] once per tick. A mob with nothing in flight
//! picks one behaviour, in priority order: flee, chase, scan for players,
//! wander. Threat bookkeeping runs every tick regardless.

use hecs::Entity;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::components::{Direction, Mob, Mobility, PendingActions, Position, Vitals};
use crate::grid;
use crate::queries;
use crate::systems::actions;
use crate::zone::{Zone, ZoneScheduler};

/// One AI tick for a mob.
pub fn mob_tick(zone: &mut Zone, sched: &mut ZoneScheduler, entity: Entity) {
    puffin::profile_function!();

    let Some(pos) = zone.position(entity) else {
        return;
    };
    let idle = zone
        .world()
        .get::<&PendingActions>(entity)
        .map(|p| p.is_idle())
        .unwrap_or(false);

    // Faint, distant and dead targets never drive a decision
    purge_threat(zone, entity, pos);
    if idle {
        decide_action(zone, sched, entity, pos);
    }
    maintain_threat(zone, entity, pos);
}

/// Pick and start the next behaviour for an idle mob.
fn decide_action(zone: &mut Zone, sched: &mut ZoneScheduler, entity: Entity, pos: (i32, i32)) {
    let (flees, kos, mobility, spawn_point, wander_radius, top) = {
        let Ok(mob) = zone.world().get::<&Mob>(entity) else {
            return;
        };
        (
            mob.flees,
            mob.kos,
            mob.mobility,
            mob.spawn_point,
            mob.wander_radius,
            mob.threat.top(),
        )
    };

    if let Some(target) = top {
        if flees && is_badly_hurt(zone, entity) {
            flee_from_target(zone, sched, entity, pos, target);
        } else {
            chase_target(zone, sched, entity, pos, target);
        }
        return;
    }

    if kos && scan_for_players(zone, entity, pos) {
        return;
    }

    if mobility == Mobility::Wander {
        random_wander(zone, sched, entity, pos, spawn_point, wander_radius);
    }
}

fn is_badly_hurt(zone: &Zone, entity: Entity) -> bool {
    let fraction = zone.config().flee_fraction;
    zone.world()
        .get::<&Vitals>(entity)
        .map(|v| v.health_remaining() <= fraction * v.health_total())
        .unwrap_or(false)
}

/// Step directly away from the target along the axis with the larger gap.
/// The column axis wins ties.
fn flee_from_target(
    zone: &mut Zone,
    sched: &mut ZoneScheduler,
    entity: Entity,
    pos: (i32, i32),
    target: Entity,
) -> bool {
    let Some(target_pos) = zone.position(target) else {
        return false;
    };
    let (dr, dc) = flee_step(pos, target_pos);
    actions::move_to(zone, sched, entity, pos.0 + dr, pos.1 + dc)
}

/// Unit step away from `target` as seen from `pos`.
pub fn flee_step(pos: (i32, i32), target: (i32, i32)) -> (i32, i32) {
    let dr = pos.0 - target.0;
    let dc = pos.1 - target.1;
    if dc.abs() >= dr.abs() {
        (0, dc.signum())
    } else {
        (dr.signum(), 0)
    }
}

/// Attack the target if adjacent, otherwise take one step along the route.
fn chase_target(
    zone: &mut Zone,
    sched: &mut ZoneScheduler,
    entity: Entity,
    pos: (i32, i32),
    target: Entity,
) -> bool {
    let Some(target_pos) = zone.position(target) else {
        return false;
    };

    if grid::is_adjacent(pos, target_pos) {
        return actions::attack(zone, sched, entity, Some(target));
    }

    match zone.next_step(pos, target_pos) {
        Some((row, col)) => actions::move_to(zone, sched, entity, row, col),
        None => {
            info!(?entity, ?target, "no route to target");
            false
        }
    }
}

/// Look for the nearest live player within the scan radius and start
/// hating them. Returns true if one was found.
fn scan_for_players(zone: &mut Zone, entity: Entity, pos: (i32, i32)) -> bool {
    let radius = zone.config().scan_radius;
    let baseline = zone.config().baseline_threat;

    let mut nearest: Option<(Entity, f64)> = None;
    for candidate in zone.targets_in_radius(pos, radius) {
        if !queries::is_player(zone.world(), candidate) || zone.is_dead(candidate) {
            continue;
        }
        let Some(candidate_pos) = zone.position(candidate) else {
            continue;
        };
        let distance = grid::distance(pos, candidate_pos);
        if nearest.map_or(true, |(_, best)| distance < best) {
            nearest = Some((candidate, distance));
        }
    }

    let Some((target, _)) = nearest else {
        return false;
    };
    if let Ok(mut mob) = zone.world().get::<&mut Mob>(entity) {
        mob.threat.set(target, baseline);
    }
    debug!(?entity, ?target, "spotted player");
    true
}

/// Queue a wander step in a random direction that keeps the mob within its
/// wander radius of the spawn point.
fn random_wander(
    zone: &mut Zone,
    sched: &mut ZoneScheduler,
    entity: Entity,
    pos: (i32, i32),
    spawn_point: Position,
    wander_radius: i32,
) -> bool {
    let here = Position::new(pos.0, pos.1);
    let options: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|&d| {
            grid::distance(here.step(d).cell(), spawn_point.cell()) <= wander_radius as f64
        })
        .collect();

    let Some(&direction) = options.choose(zone.rng_mut()) else {
        return false;
    };
    actions::wander(zone, sched, entity, direction)
}

/// Decay threat on distant targets and forget the ones that are too far,
/// too faint, or dead.
fn maintain_threat(zone: &Zone, entity: Entity, pos: (i32, i32)) {
    let config = zone.config();
    let (forget_distance, forget_factor) = (config.forget_distance, config.forget_factor);

    let Some(distances) = threat_distances(zone, entity, pos) else {
        return;
    };
    if let Ok(mut mob) = zone.world().get::<&mut Mob>(entity) {
        for (target, threat) in mob.threat.iter_mut() {
            if distance_to(&distances, *target).is_some_and(|d| d > forget_distance) {
                *threat *= forget_factor;
            }
        }
    }
    purge_threat(zone, entity, pos);
}

/// Drop entries past the purge distance, below the minimum threat, or whose
/// target is gone or dead.
fn purge_threat(zone: &Zone, entity: Entity, pos: (i32, i32)) {
    let config = zone.config();
    let (purge_distance, min_threat) = (config.purge_distance, config.min_threat);

    let Some(distances) = threat_distances(zone, entity, pos) else {
        return;
    };
    let Ok(mut mob) = zone.world().get::<&mut Mob>(entity) else {
        return;
    };
    mob.threat
        .retain(|target, threat| match distance_to(&distances, target) {
            Some(d) => d <= purge_distance && threat >= min_threat,
            None => false,
        });
}

/// Distance to each threat target, None for targets that are gone or dead.
/// None overall when the table is empty.
fn threat_distances(
    zone: &Zone,
    entity: Entity,
    pos: (i32, i32),
) -> Option<Vec<(Entity, Option<f64>)>> {
    let mob = zone.world().get::<&Mob>(entity).ok()?;
    if mob.threat.is_empty() {
        return None;
    }
    let distances: Vec<_> = mob
        .threat
        .iter()
        .map(|(target, _)| {
            let distance = if zone.is_dead(target) {
                None
            } else {
                zone.position(target).map(|t| grid::distance(pos, t))
            };
            (target, distance)
        })
        .collect();
    Some(distances)
}

fn distance_to(distances: &[(Entity, Option<f64>)], target: Entity) -> Option<f64> {
    distances
        .iter()
        .find(|(e, _)| *e == target)
        .and_then(|(_, d)| *d)
}
