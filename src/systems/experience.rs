//! Experience and leveling system.

use hecs::Entity;
use tracing::info;

use crate::components::{Player, Vitals};
use crate::constants::*;
use crate::events::GameEvent;
use crate::queries;
use crate::zone::Zone;

/// Total experience needed to advance past `level`. Experience is never
/// reset, so this is a running threshold, not a per-level amount.
pub fn experience_needed(level: u32) -> f64 {
    let level = level as f64;
    ((1.0 + level) / 2.0 * level) * (level + EXP_CURVE_OFFSET)
}

/// Experience a mob is worth to whoever kills it
pub fn mob_experience(level: u32) -> u32 {
    level * MOB_EXP_PER_LEVEL
}

/// Relative difficulty of something at `other_level` for a viewer at
/// `viewer_level`. Zero when equal.
pub fn con(viewer_level: u32, other_level: u32) -> f64 {
    if viewer_level == other_level {
        0.0
    } else {
        1.0 / (other_level as f64 - viewer_level as f64)
    }
}

/// Raise `vitals.level` while the experience total covers the next
/// threshold. Returns the number of levels gained.
pub fn apply_level_ups(player: &Player, vitals: &mut Vitals) -> u32 {
    let mut gained = 0;
    while player.experience as f64 >= experience_needed(vitals.level) {
        vitals.level += 1;
        gained += 1;
    }
    gained
}

/// Add experience to a player and level them up as far as it goes.
/// Non-players are ignored.
pub fn grant_experience(zone: &mut Zone, entity: Entity, amount: u32) -> u32 {
    {
        let Ok(mut player) = zone.world().get::<&mut Player>(entity) else {
            return 0;
        };
        player.experience += amount;
    }
    check_level_up(zone, entity)
}

/// Level a player up if their experience allows it, announcing each level.
pub fn check_level_up(zone: &mut Zone, entity: Entity) -> u32 {
    let (gained, new_level) = {
        let world = zone.world();
        let (Ok(player), Ok(mut vitals)) = (
            world.get::<&Player>(entity),
            world.get::<&mut Vitals>(entity),
        ) else {
            return 0;
        };
        let start = vitals.level;
        let gained = apply_level_ups(&player, &mut vitals);
        let level = vitals.level;
        if gained > 0 {
            info!(?entity, from = start, to = level, "level up");
        }
        (gained, level)
    };

    let name = queries::display_name(zone.world(), entity);
    for level in (new_level + 1 - gained)..=new_level {
        zone.events.push(GameEvent::LevelUp {
            entity,
            new_level: level,
        });
        zone.events.message(format!("{name}: Ding! level {level}"));
    }
    gained
}
