//! Game engine - owns all simulation state and provides a clean API to the host.
//!
//! The engine handles:
//! - The zone (grid, entities, events) and the scheduler that drives it
//! - Spawning and player designation
//! - Player commands
//! - Advancing time, logically or against the wall clock
//!
//! The host (main.rs) only handles:
//! - Loading configuration and installing logging
//! - Choosing commands
//! - Showing what the engine reports

pub mod initialization;

use std::ops::ControlFlow;

use hecs::Entity;

use crate::config::SimConfig;
use crate::error::Result;
use crate::events::GameEvent;
use crate::grid::Grid;
use crate::queries::{self, PlayerStatus};
use crate::spawning::{MobDef, PlayerDef};
use crate::systems::player_input::{self, PlayerCommand};
use crate::time_system::Tick;
use crate::zone::{Zone, ZoneScheduler};

/// The game engine - owns the zone and its scheduler side by side, so that
/// scheduled actions can borrow both.
pub struct GameEngine {
    pub zone: Zone,
    pub scheduler: ZoneScheduler,
}

impl GameEngine {
    /// Engine over an empty zone sized by the config.
    pub fn new(config: SimConfig) -> Result<Self> {
        let scheduler = ZoneScheduler::from_config(&config);
        let zone = Zone::new(config)?;
        Ok(Self { zone, scheduler })
    }

    /// Engine over a pre-built terrain grid.
    pub fn from_grid(config: SimConfig, grid: Grid) -> Result<Self> {
        let scheduler = ZoneScheduler::from_config(&config);
        let zone = Zone::with_grid(config, grid)?;
        Ok(Self { zone, scheduler })
    }

    // =========================================================================
    // SPAWNING
    // =========================================================================

    /// Spawn a player and make it the designated player.
    pub fn spawn_player(&mut self, def: &PlayerDef, row: i32, col: i32) -> Result<Entity> {
        let entity = def.spawn(&mut self.zone, &mut self.scheduler, row, col)?;
        self.zone.set_player(entity)?;
        Ok(entity)
    }

    pub fn spawn_mob(&mut self, def: &MobDef, row: i32, col: i32) -> Result<Entity> {
        def.spawn(&mut self.zone, &mut self.scheduler, row, col)
    }

    /// Designate an already spawned entity as the player.
    pub fn set_player(&mut self, entity: Entity) -> Result<()> {
        self.zone.set_player(entity)
    }

    pub fn player(&self) -> Option<Entity> {
        self.zone.player()
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    /// Route a command to the designated player. Returns false if there is
    /// no player or the command was refused.
    pub fn command(&mut self, command: PlayerCommand) -> bool {
        let Some(player) = self.zone.player() else {
            return false;
        };
        player_input::apply_command(&mut self.zone, &mut self.scheduler, player, command)
    }

    // =========================================================================
    // TIME
    // =========================================================================

    pub fn now(&self) -> Tick {
        self.scheduler.now()
    }

    /// Advance logical time by `ticks` without sleeping.
    pub fn advance(&mut self, ticks: Tick) {
        self.scheduler.advance(ticks, &mut self.zone);
    }

    /// Jump to the next deadline and run it. Returns false if nothing is
    /// scheduled.
    pub fn step(&mut self) -> bool {
        self.scheduler.step(&mut self.zone)
    }

    /// Run in real time until the player dies or nothing is left scheduled.
    pub fn run(&mut self) {
        self.run_with(|_, _| ControlFlow::Continue(()));
    }

    /// Like [`Self::run`], handing control to `after_pass` after every
    /// dispatch pass. Breaking from `after_pass` stops the loop.
    pub fn run_with(
        &mut self,
        mut after_pass: impl FnMut(&mut Zone, &mut ZoneScheduler) -> ControlFlow<()>,
    ) {
        self.scheduler.run(&mut self.zone, |zone, sched| {
            if zone.shutdown_requested() {
                return ControlFlow::Break(());
            }
            after_pass(zone, sched)
        });
    }

    /// True once the player has died.
    pub fn is_over(&self) -> bool {
        self.zone.shutdown_requested()
    }

    // =========================================================================
    // OUTPUT
    // =========================================================================

    pub fn player_status(&self) -> Option<PlayerStatus> {
        queries::player_status(self.zone.world(), self.zone.player()?)
    }

    /// Take every event produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.zone.events.drain().collect()
    }
}
