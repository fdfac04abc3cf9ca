//! Simulation event system for decoupled communication with collaborators.
//!
//! The zone pushes events as things happen; a renderer, message log or host
//! drains them whenever it likes. Nothing in the simulation core reads them.

use hecs::Entity;

/// Simulation events collaborators can subscribe to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A cell's contents changed (place, unplace or move)
    CellChanged { row: i32, col: i32 },
    /// An entity hit another entity
    AttackHit {
        attacker: Entity,
        target: Entity,
        damage: f64,
    },
    /// An entity died and left the zone
    EntityDied { entity: Entity },
    /// A player gained a level
    LevelUp { entity: Entity, new_level: u32 },
    /// The designated player died; the host should shut down
    PlayerDied { entity: Entity },
    /// Human-readable text for a message log
    Message(String),
}

/// Simple event queue - events are pushed during dispatch, drained by the host
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Push an event to be processed later
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Push a log message
    pub fn message(&mut self, text: impl Into<String>) {
        self.events.push(GameEvent::Message(text.into()));
    }

    /// Drain all events for processing
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    /// Peek at pending events without consuming them
    pub fn pending(&self) -> &[GameEvent] {
        &self.events
    }

    /// Check if there are pending events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
