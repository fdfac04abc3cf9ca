//! The zone: sole owner of the grid and of every entity on it.
//!
//! Entities live in the zone's `hecs::World` and are referred to everywhere
//! else by their `Entity` id, which never keeps anything alive. The zone is
//! also the context every scheduled action runs against, so it carries the
//! config, the RNG and the outgoing event queue.
//!
//! Invariant: for every tracked entity `e` at `(row, col)`,
//! `grid[row][col] == Occupant(e)` and `e`'s `Position` is `(row, col)`.

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::components::{Player, Position};
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::events::{EventQueue, GameEvent};
use crate::grid::{self, Cell, Grid};
use crate::pathfinding;
use crate::queries;
use crate::spatial_cache::SpatialCache;
use crate::time_system::EventScheduler;

/// Scheduler whose actions run against a zone.
pub type ZoneScheduler = EventScheduler<Zone>;

pub struct Zone {
    config: SimConfig,
    grid: Grid,
    world: World,
    cache: SpatialCache,
    rng: StdRng,
    player: Option<Entity>,
    shutdown: bool,
    pub events: EventQueue,
}

impl Zone {
    /// Empty zone sized by the config.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let grid = Grid::new(config.rows, config.cols);
        Self::with_grid(config, grid)
    }

    /// Zone over a pre-built terrain grid. The grid's dimensions win over the
    /// config's.
    pub fn with_grid(mut config: SimConfig, grid: Grid) -> Result<Self> {
        config.rows = grid.rows;
        config.cols = grid.cols;
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            grid,
            world: World::new(),
            cache: SpatialCache::new(),
            rng,
            player: None,
            shutdown: false,
            events: EventQueue::new(),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    // =========================================================================
    // GRID MANIPULATION
    // =========================================================================

    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        self.grid.get(row, col).copied()
    }

    pub fn is_occupied(&self, row: i32, col: i32) -> bool {
        self.grid.is_occupied(row, col)
    }

    /// Put an entity on the grid. No-op (returns false) if the cell is out of
    /// bounds or occupied. An entity that is already on the grid is moved.
    pub fn place(&mut self, entity: Entity, row: i32, col: i32) -> bool {
        if self.cache.contains(entity) {
            return self.move_entity(entity, row, col);
        }
        if !self.grid.is_free(row, col) || !self.world.contains(entity) {
            return false;
        }

        self.grid.set(row, col, Cell::Occupant(entity));
        self.set_position(entity, row, col);
        self.cache.register_entity(entity, (row, col));
        self.events.push(GameEvent::CellChanged { row, col });
        debug!(?entity, row, col, "placed");
        true
    }

    /// Clear a cell, returning the entity that stood there, if any.
    pub fn unplace(&mut self, row: i32, col: i32) -> Option<Entity> {
        let cell = self.get(row, col)?;
        self.grid.set(row, col, Cell::Empty);
        if !cell.is_empty() {
            self.events.push(GameEvent::CellChanged { row, col });
        }
        let entity = cell.occupant()?;
        self.cache.remove_entity(entity);
        Some(entity)
    }

    /// Move a placed entity. Clears the old cell and fills the new one only
    /// if the target is in bounds and free; otherwise nothing changes.
    pub fn move_entity(&mut self, entity: Entity, row: i32, col: i32) -> bool {
        let Some((old_row, old_col)) = self.cache.position(entity) else {
            return false;
        };
        if !self.grid.is_free(row, col) {
            return false;
        }

        self.grid.set(old_row, old_col, Cell::Empty);
        self.grid.set(row, col, Cell::Occupant(entity));
        self.set_position(entity, row, col);
        self.cache.update_position(entity, (row, col));
        self.events.push(GameEvent::CellChanged {
            row: old_row,
            col: old_col,
        });
        self.events.push(GameEvent::CellChanged { row, col });
        true
    }

    fn set_position(&mut self, entity: Entity, row: i32, col: i32) {
        let position = Position::new(row, col);
        if let Ok(mut pos) = self.world.get::<&mut Position>(entity) {
            *pos = position;
            return;
        }
        let _ = self.world.insert_one(entity, position);
    }

    // =========================================================================
    // ENTITY LIFECYCLE
    // =========================================================================

    /// Place a freshly spawned entity at its `Position`. Unlike [`Zone::place`]
    /// this is setup, so a bad position is an error.
    pub fn add_spawn(&mut self, entity: Entity) -> Result<()> {
        let (row, col) = queries::get_entity_position(&self.world, entity)
            .ok_or(SimError::NoSuchEntity(entity))?;
        match self.get(row, col) {
            None => Err(SimError::OutOfBounds { row, col }),
            Some(cell) if !cell.is_empty() => Err(SimError::Occupied { row, col }),
            Some(_) => {
                self.place(entity, row, col);
                Ok(())
            }
        }
    }

    /// Take an entity off the grid and drop it from the world.
    pub fn remove_spawn(&mut self, entity: Entity) {
        if let Some((row, col)) = self.cache.position(entity) {
            self.unplace(row, col);
        }
        if self.player == Some(entity) {
            self.player = None;
        }
        let _ = self.world.despawn(entity);
    }

    /// Designate the player entity.
    pub fn set_player(&mut self, entity: Entity) -> Result<()> {
        if !self.world.contains(entity) {
            return Err(SimError::NoSuchEntity(entity));
        }
        if self.world.get::<&Player>(entity).is_err() {
            return Err(SimError::NotAPlayer(entity));
        }
        self.player = Some(entity);
        Ok(())
    }

    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    /// Raised when the player dies; the host is expected to shut down.
    pub fn request_shutdown(&mut self) {
        if !self.shutdown {
            info!("shutdown requested");
        }
        self.shutdown = true;
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown
    }

    // =========================================================================
    // SPATIAL QUERIES
    // =========================================================================

    /// Position of a tracked entity.
    pub fn position(&self, entity: Entity) -> Option<(i32, i32)> {
        self.cache.position(entity)
    }

    /// Every tracked entity and where it stands.
    pub fn spawns(&self) -> impl Iterator<Item = (Entity, (i32, i32))> + '_ {
        self.cache.iter()
    }

    pub fn spawn_count(&self) -> usize {
        self.cache.len()
    }

    /// Euclidean distance between two tracked entities.
    pub fn distance(&self, a: Entity, b: Entity) -> Option<f64> {
        Some(grid::distance(self.position(a)?, self.position(b)?))
    }

    /// Entities standing in the square of half-width `radius` around a cell,
    /// row-major.
    pub fn targets_in_radius(&self, center: (i32, i32), radius: i32) -> Vec<Entity> {
        self.grid
            .cells_in_radius(center.0, center.1, radius)
            .filter_map(|(r, c)| self.grid.occupant(r, c))
            .collect()
    }

    /// Bounded shortest path, endpoints included.
    pub fn route(&self, from: (i32, i32), to: (i32, i32)) -> Option<Vec<(i32, i32)>> {
        pathfinding::route(&self.grid, from, to, self.config.route_radius)
    }

    /// First step of the route from `from` to `to`.
    pub fn next_step(&self, from: (i32, i32), to: (i32, i32)) -> Option<(i32, i32)> {
        pathfinding::next_step_toward(&self.grid, from, to, self.config.route_radius)
    }

    pub fn is_dead(&self, entity: Entity) -> bool {
        queries::is_entity_dead(&self.world, entity)
    }

    /// Check the grid/position invariant for every tracked entity.
    pub fn check_invariant(&self) -> bool {
        self.cache.iter().all(|(entity, (row, col))| {
            self.grid.occupant(row, col) == Some(entity)
                && queries::get_entity_position(&self.world, entity) == Some((row, col))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Direction;
    use crate::grid::Terrain;
    use proptest::prelude::*;

    fn zone(lines: &[&str]) -> Zone {
        let config = SimConfig {
            seed: Some(1),
            ..SimConfig::default()
        };
        Zone::with_grid(config, Grid::from_ascii(lines).unwrap()).unwrap()
    }

    fn spawn_at(zone: &mut Zone, row: i32, col: i32) -> Entity {
        let entity = zone.world_mut().spawn((Position::new(row, col),));
        zone.add_spawn(entity).unwrap();
        entity
    }

    #[test]
    fn test_add_spawn_places_entity() {
        let mut zone = zone(&["...", "...", "..."]);
        let entity = spawn_at(&mut zone, 1, 2);
        assert_eq!(zone.get(1, 2), Some(Cell::Occupant(entity)));
        assert_eq!(zone.position(entity), Some((1, 2)));
        assert!(zone.check_invariant());
        assert_eq!(
            zone.events.pending(),
            &[GameEvent::CellChanged { row: 1, col: 2 }]
        );
    }

    #[test]
    fn test_add_spawn_rejects_bad_positions() {
        let mut zone = zone(&["#..", "..."]);
        let on_wall = zone.world_mut().spawn((Position::new(0, 0),));
        assert!(matches!(zone.add_spawn(on_wall), Err(SimError::Occupied { .. })));

        let outside = zone.world_mut().spawn((Position::new(9, 9),));
        assert!(matches!(zone.add_spawn(outside), Err(SimError::OutOfBounds { .. })));

        let nowhere = zone.world_mut().spawn(());
        assert!(matches!(zone.add_spawn(nowhere), Err(SimError::NoSuchEntity(_))));
    }

    #[test]
    fn test_move_updates_both_sides() {
        let mut zone = zone(&["...", "...", "..."]);
        let entity = spawn_at(&mut zone, 0, 0);
        zone.events.drain().for_each(drop);

        assert!(zone.move_entity(entity, 0, 1));
        assert_eq!(zone.get(0, 0), Some(Cell::Empty));
        assert_eq!(zone.get(0, 1), Some(Cell::Occupant(entity)));
        assert_eq!(
            queries::get_entity_position(zone.world(), entity),
            Some((0, 1))
        );
        assert_eq!(zone.events.pending().len(), 2);
        assert!(zone.check_invariant());
    }

    #[test]
    fn test_move_into_blocked_cell_is_noop() {
        let mut zone = zone(&[".#.", "...", "..."]);
        let entity = spawn_at(&mut zone, 0, 0);
        let other = spawn_at(&mut zone, 1, 0);

        assert!(!zone.move_entity(entity, 0, 1)); // terrain
        assert!(!zone.move_entity(entity, 1, 0)); // entity
        assert!(!zone.move_entity(entity, -1, 0)); // outside
        assert_eq!(zone.position(entity), Some((0, 0)));
        assert_eq!(zone.position(other), Some((1, 0)));
        assert!(zone.check_invariant());
    }

    #[test]
    fn test_place_rejects_occupied_or_outside() {
        let mut zone = zone(&["#.", ".."]);
        let entity = zone.world_mut().spawn(());
        assert!(!zone.place(entity, 0, 0));
        assert!(!zone.place(entity, 2, 0));
        assert!(zone.place(entity, 1, 1));
        assert_eq!(zone.position(entity), Some((1, 1)));
    }

    #[test]
    fn test_unplace_and_remove_spawn() {
        let mut zone = zone(&["..", ".."]);
        let entity = spawn_at(&mut zone, 1, 1);

        assert_eq!(zone.unplace(1, 1), Some(entity));
        assert!(!zone.is_occupied(1, 1));
        assert_eq!(zone.position(entity), None);

        let other = spawn_at(&mut zone, 0, 0);
        zone.remove_spawn(other);
        assert!(!zone.world().contains(other));
        assert!(!zone.is_occupied(0, 0));
        assert_eq!(zone.spawn_count(), 0);
    }

    #[test]
    fn test_unplace_clears_terrain() {
        let mut zone = zone(&["#."]);
        assert_eq!(zone.unplace(0, 0), None);
        assert_eq!(zone.get(0, 0), Some(Cell::Empty));
        assert_eq!(zone.unplace(5, 5), None);
    }

    #[test]
    fn test_set_player_requires_player_component() {
        let mut zone = zone(&["..."]);
        let mob = spawn_at(&mut zone, 0, 0);
        assert!(matches!(zone.set_player(mob), Err(SimError::NotAPlayer(_))));

        let player = zone
            .world_mut()
            .spawn((Position::new(0, 1), Player::default()));
        zone.add_spawn(player).unwrap();
        zone.set_player(player).unwrap();
        assert_eq!(zone.player(), Some(player));
    }

    #[test]
    fn test_targets_in_radius() {
        let mut zone = zone(&[".....", ".....", ".....", ".....", "....."]);
        let near = spawn_at(&mut zone, 1, 1);
        let far = spawn_at(&mut zone, 4, 4);
        let center = spawn_at(&mut zone, 2, 2);

        assert_eq!(zone.targets_in_radius((2, 2), 1), vec![near]);
        let all = zone.targets_in_radius((2, 2), 2);
        assert!(all.contains(&far));
        assert!(!all.contains(&center));
    }

    #[test]
    fn test_route_uses_configured_radius() {
        let mut zone = zone(&["..........", ".........."]);
        zone.grid.set_terrain(0, 5, Terrain('#')).unwrap();
        let path = zone.route((0, 0), (0, 9)).unwrap();
        assert_eq!(path.len(), 12);
    }

    #[test]
    fn test_next_step_goes_around_walls() {
        let zone = zone(&["...", "#..", "..."]);
        assert_eq!(zone.next_step((0, 0), (2, 0)), Some((0, 1)));
        assert_eq!(zone.next_step((0, 0), (0, 0)), None);
    }

    #[test]
    fn test_distance_between_entities() {
        let mut zone = zone(&[".....", ".....", ".....", "....."]);
        let a = spawn_at(&mut zone, 0, 0);
        let b = spawn_at(&mut zone, 3, 4);
        assert_eq!(zone.distance(a, b), Some(5.0));
    }

    proptest! {
        #[test]
        fn prop_moves_keep_grid_and_positions_in_sync(
            moves in prop::collection::vec((0usize..3, 0usize..4), 0..60)
        ) {
            let mut zone = zone(&[
                "......",
                ".#..#.",
                "......",
                "..#...",
            ]);
            let entities = [
                spawn_at(&mut zone, 0, 0),
                spawn_at(&mut zone, 2, 3),
                spawn_at(&mut zone, 3, 5),
            ];

            for (who, dir) in moves {
                let entity = entities[who];
                let (row, col) = zone.position(entity).unwrap();
                let (dr, dc) = Direction::ALL[dir].delta();
                zone.move_entity(entity, row + dr, col + dc);
                prop_assert!(zone.check_invariant());
            }
            prop_assert_eq!(zone.spawn_count(), 3);
        }
    }
}
