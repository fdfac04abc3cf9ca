//! Zone initialization - builds the starting zone and spawns its population.

use crate::config::SimConfig;
use crate::error::Result;
use crate::grid::Grid;
use crate::spawning::{MobDef, PlayerDef};

use super::GameEngine;

/// Level the demo player starts at
const DEMO_PLAYER_LEVEL: u32 = 2;
/// Number of mobs lined up along the demo column
const DEMO_MOB_COUNT: u32 = 10;
/// Column the demo mobs start in
const DEMO_MOB_COL: i32 = 10;

/// Terrain for the demo zone: an open field with a few walls to route around.
const DEMO_MAP: &[&str] = &[
    "........................",
    "........................",
    "...####.................",
    "......#.........#.......",
    "......#.........#.......",
    "................#.......",
    "........................",
    ".............####.......",
    "........................",
    "....#...................",
    "....#...........####....",
    "....#...................",
    "........................",
    "........................",
];

/// The demo terrain as a grid.
pub fn demo_grid() -> Result<Grid> {
    Grid::from_ascii(DEMO_MAP)
}

impl GameEngine {
    /// The demo scenario: a level 2 player in the top-left corner and ten
    /// level 1 mobs, glyphs `1` to `0`, in a column to its right.
    pub fn demo(config: SimConfig) -> Result<Self> {
        let mut engine = Self::from_grid(config, demo_grid()?)?;

        let player = PlayerDef {
            level: DEMO_PLAYER_LEVEL,
            ..PlayerDef::default()
        };
        engine.spawn_player(&player, 1, 1)?;

        for i in 1..=DEMO_MOB_COUNT {
            let avatar = char::from_digit(i % 10, 10).unwrap_or('m');
            engine.spawn_mob(&MobDef::with_avatar(avatar), i as i32 + 1, DEMO_MOB_COL)?;
        }
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_population() {
        let config = SimConfig {
            seed: Some(7),
            ..SimConfig::default()
        };
        let engine = GameEngine::demo(config).unwrap();
        assert_eq!(engine.zone.spawn_count(), 11);
        assert_eq!(engine.player_status().unwrap().level, 2);
        assert_eq!(engine.zone.grid().rows, DEMO_MAP.len());
        assert!(engine.zone.check_invariant());
    }

    #[test]
    fn test_demo_runs_headless() {
        let config = SimConfig {
            seed: Some(7),
            ..SimConfig::default()
        };
        let mut engine = GameEngine::demo(config).unwrap();
        engine.advance(600);
        assert!(engine.zone.check_invariant());
        assert_eq!(engine.now(), 600);
    }
}
