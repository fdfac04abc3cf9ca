use std::collections::HashMap;

use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::time_system::TaskHandle;

/// Position component - grid coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn cell(&self) -> (i32, i32) {
        (self.row, self.col)
    }

    pub fn step(&self, direction: Direction) -> Self {
        let (dr, dc) = direction.delta();
        Self::new(self.row + dr, self.col + dc)
    }
}

/// One of the four unit vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// (row, col) delta
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
        }
    }

    pub fn from_delta(delta: (i32, i32)) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.delta() == delta)
    }
}

/// Facing component - direction the entity last turned to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Facing(pub Direction);

impl Default for Facing {
    fn default() -> Self {
        Facing(Direction::Right)
    }
}

/// Avatar component - display glyph, also names the entity in messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Avatar(pub char);

/// Vitals component - level, combat ratings and damage taken
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vitals {
    pub level: u32,
    pub attack_rating: i32,
    pub health_rating: i32,
    pub armor_rating: i32,
    pub damage_taken: f64,
}

impl Vitals {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            attack_rating: BASE_ATTACK_RATING,
            health_rating: BASE_HEALTH_RATING,
            armor_rating: BASE_ARMOR_RATING,
            damage_taken: 0.0,
        }
    }

    pub fn health_total(&self) -> f64 {
        self.health_rating as f64 * self.level as f64
    }

    pub fn health_remaining(&self) -> f64 {
        self.health_total() - self.damage_taken
    }

    pub fn is_dead(&self) -> bool {
        self.health_remaining() < 1.0
    }

    /// Damage dealt before mitigation
    pub fn attack(&self) -> f64 {
        self.attack_rating as f64 * self.level as f64
    }

    pub fn armor(&self) -> f64 {
        self.armor_rating as f64 * self.level as f64
    }
}

impl Default for Vitals {
    fn default() -> Self {
        Self::new(STARTING_LEVEL)
    }
}

/// Player component - marks the user-controlled entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Player {
    /// Running total, never reset on level-up
    pub experience: u32,
}

/// How an idle mob spends its time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mobility {
    Wander,
    Stationary,
}

/// Accumulated aggression toward other entities.
///
/// Backed by a vector so that iteration, and therefore the choice between
/// equally hated targets, is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreatTable {
    entries: Vec<(Entity, f64)>,
}

impl ThreatTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, entity: Entity) -> Option<f64> {
        self.entries
            .iter()
            .find(|(e, _)| *e == entity)
            .map(|(_, threat)| *threat)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    /// Add to an entity's threat, creating the entry at zero if needed.
    pub fn add(&mut self, entity: Entity, amount: f64) {
        match self.entries.iter_mut().find(|(e, _)| *e == entity) {
            Some((_, threat)) => *threat += amount,
            None => self.entries.push((entity, amount)),
        }
    }

    /// Overwrite an entity's threat.
    pub fn set(&mut self, entity: Entity, threat: f64) {
        match self.entries.iter_mut().find(|(e, _)| *e == entity) {
            Some((_, current)) => *current = threat,
            None => self.entries.push((entity, threat)),
        }
    }

    /// Most hated entity; the first one found wins ties.
    pub fn top(&self) -> Option<Entity> {
        let mut best: Option<(Entity, f64)> = None;
        for &(entity, threat) in &self.entries {
            if best.map_or(true, |(_, top)| threat > top) {
                best = Some((entity, threat));
            }
        }
        best.map(|(entity, _)| entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Entity, &mut f64)> + '_ {
        self.entries.iter_mut().map(|(e, threat)| (&*e, threat))
    }

    pub fn retain(&mut self, mut keep: impl FnMut(Entity, f64) -> bool) {
        self.entries.retain(|&(e, threat)| keep(e, threat));
    }
}

/// Mob component - AI-driven creature
#[derive(Debug, Clone, PartialEq)]
pub struct Mob {
    pub threat: ThreatTable,
    /// Kill on sight: scan for players and engage
    pub kos: bool,
    /// Run away when badly hurt
    pub flees: bool,
    pub mobility: Mobility,
    pub spawn_point: Position,
    pub wander_radius: i32,
}

impl Mob {
    pub fn new(spawn_point: Position) -> Self {
        Self {
            threat: ThreatTable::new(),
            kos: true,
            flees: false,
            mobility: Mobility::Wander,
            spawn_point,
            wander_radius: DEFAULT_WANDER_RADIUS,
        }
    }
}

/// Kinds of debounced action an entity can have in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Move,
    Attack,
    Wander,
}

/// PendingActions component - at most one scheduled action per kind
#[derive(Debug, Clone, Default)]
pub struct PendingActions {
    slots: HashMap<ActionKind, TaskHandle>,
}

impl PendingActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing of any kind in flight
    pub fn is_idle(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_pending(&self, kind: ActionKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn handle(&self, kind: ActionKind) -> Option<TaskHandle> {
        self.slots.get(&kind).copied()
    }

    pub fn insert(&mut self, kind: ActionKind, handle: TaskHandle) {
        self.slots.insert(kind, handle);
    }

    pub fn clear(&mut self, kind: ActionKind) {
        self.slots.remove(&kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    #[test]
    fn test_vitals_derived_values() {
        let mut vitals = Vitals::new(3);
        assert_eq!(vitals.health_total(), 30.0);
        assert_eq!(vitals.attack(), 6.0);
        assert_eq!(vitals.armor(), 3.0);

        vitals.damage_taken = 29.5;
        assert_eq!(vitals.health_remaining(), 0.5);
        assert!(vitals.is_dead());

        vitals.damage_taken = 29.0;
        assert!(!vitals.is_dead());
    }

    #[test]
    fn test_direction_round_trip() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_delta(direction.delta()), Some(direction));
        }
        assert_eq!(Direction::from_delta((1, 1)), None);
        assert_eq!(Position::new(2, 2).step(Direction::Left), Position::new(2, 1));
    }

    #[test]
    fn test_threat_add_accumulates() {
        let mut world = World::new();
        let a = world.spawn(());
        let mut table = ThreatTable::new();
        table.add(a, 2.0);
        table.add(a, 3.5);
        assert_eq!(table.get(a), Some(5.5));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_threat_top_prefers_first_on_tie() {
        let mut world = World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let c = world.spawn(());
        let mut table = ThreatTable::new();
        table.set(a, 4.0);
        table.set(b, 4.0);
        table.set(c, 1.0);
        assert_eq!(table.top(), Some(a));

        table.add(b, 0.5);
        assert_eq!(table.top(), Some(b));
    }

    #[test]
    fn test_threat_retain() {
        let mut world = World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let mut table = ThreatTable::new();
        table.set(a, 0.5);
        table.set(b, 3.0);

        table.retain(|_, threat| threat >= 1.0);
        assert!(!table.contains(a));
        assert_eq!(table.top(), Some(b));
        table.retain(|target, _| target != b);
        assert!(table.is_empty());
        assert_eq!(table.top(), None);
    }
}
