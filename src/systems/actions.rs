//! Debounced entity actions.
//!
//! Entities never act immediately: a request schedules the effect a fixed
//! delay out, and while one action of a kind is in flight further requests
//! of the same kind are ignored. The slot is released just before the effect
//! runs, so the effect itself may queue the next action of its kind.

use hecs::Entity;
use tracing::debug;

use crate::components::{ActionKind, Direction, Facing, PendingActions, Position};
use crate::systems::combat;
use crate::time_system::{TaskHandle, Tick};
use crate::zone::{Zone, ZoneScheduler};

/// Schedule `effect` for `entity` unless an action of the same kind is
/// already pending. Entities without a [`PendingActions`] component cannot
/// act. The task is owned by the entity, so it dies with it.
pub fn schedule_action(
    zone: &mut Zone,
    sched: &mut ZoneScheduler,
    entity: Entity,
    kind: ActionKind,
    delay: Tick,
    effect: impl FnOnce(&mut Zone, &mut ZoneScheduler) + 'static,
) -> Option<TaskHandle> {
    match zone.world().get::<&PendingActions>(entity) {
        Ok(pending) if pending.is_pending(kind) => {
            debug!(?entity, ?kind, "action already pending, request ignored");
            return None;
        }
        Ok(_) => {}
        Err(_) => return None,
    }

    let handle = sched.schedule_once_for(
        entity,
        delay,
        move |zone: &mut Zone, sched: &mut ZoneScheduler| {
            if let Ok(mut pending) = zone.world().get::<&mut PendingActions>(entity) {
                pending.clear(kind);
            }
            effect(zone, sched);
        },
    );

    if let Ok(mut pending) = zone.world().get::<&mut PendingActions>(entity) {
        pending.insert(kind, handle);
    }
    Some(handle)
}

/// Cancel whatever action of `kind` the entity has in flight.
pub fn cancel_action(
    zone: &mut Zone,
    sched: &mut ZoneScheduler,
    entity: Entity,
    kind: ActionKind,
) -> bool {
    let Ok(mut pending) = zone.world().get::<&mut PendingActions>(entity) else {
        return false;
    };
    let Some(handle) = pending.handle(kind) else {
        return false;
    };
    pending.clear(kind);
    sched.cancel(handle)
}

// =============================================================================
// MOVEMENT
// =============================================================================

/// Request a move to `(row, col)`. The move happens after the configured
/// move delay, and only if the cell is still free then.
pub fn move_to(
    zone: &mut Zone,
    sched: &mut ZoneScheduler,
    entity: Entity,
    row: i32,
    col: i32,
) -> bool {
    let delay = zone.config().move_delay;
    let effect = move |zone: &mut Zone, _: &mut ZoneScheduler| {
        zone.move_entity(entity, row, col);
    };
    schedule_action(zone, sched, entity, ActionKind::Move, delay, effect).is_some()
}

/// Turn to face `direction` and request a step that way. The turn happens
/// at once, even if the step is refused.
pub fn move_cardinal(
    zone: &mut Zone,
    sched: &mut ZoneScheduler,
    entity: Entity,
    direction: Direction,
) -> bool {
    if let Ok(mut facing) = zone.world().get::<&mut Facing>(entity) {
        facing.0 = direction;
    }
    let Some((row, col)) = zone.position(entity) else {
        return false;
    };
    let target = Position::new(row, col).step(direction);
    move_to(zone, sched, entity, target.row, target.col)
}

/// Schedule a wander step: after the wander delay, turn and request a step
/// in `direction`.
pub fn wander(
    zone: &mut Zone,
    sched: &mut ZoneScheduler,
    entity: Entity,
    direction: Direction,
) -> bool {
    let delay = zone.config().wander_delay;
    let effect = move |zone: &mut Zone, sched: &mut ZoneScheduler| {
        move_cardinal(zone, sched, entity, direction);
    };
    schedule_action(zone, sched, entity, ActionKind::Wander, delay, effect).is_some()
}

// =============================================================================
// COMBAT
// =============================================================================

/// The entity standing in the cell `entity` faces.
pub fn faced_target(zone: &Zone, entity: Entity) -> Option<Entity> {
    let direction = zone.world().get::<&Facing>(entity).ok()?.0;
    let (row, col) = zone.position(entity)?;
    let faced = Position::new(row, col).step(direction);
    zone.grid().occupant(faced.row, faced.col)
}

/// Request an attack on `target`, or on whatever is in the faced cell when
/// no target is given. Refused when there is nothing in reach.
pub fn attack(
    zone: &mut Zone,
    sched: &mut ZoneScheduler,
    attacker: Entity,
    target: Option<Entity>,
) -> bool {
    let Some(target) = target.or_else(|| faced_target(zone, attacker)) else {
        return false;
    };
    if target == attacker || !combat::can_hit(zone, attacker, target) {
        return false;
    }
    let delay = zone.config().attack_delay;
    let effect = move |zone: &mut Zone, sched: &mut ZoneScheduler| {
        combat::resolve_attack(zone, sched, attacker, target);
    };
    schedule_action(zone, sched, attacker, ActionKind::Attack, delay, effect).is_some()
}
