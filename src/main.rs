//! Headless host: runs the demo zone in real time with the player on
//! autopilot, logging the message feed, until the player dies or the zone
//! is cleared.
//!
//! Usage: `gridsim [config.json]`. Log verbosity follows `RUST_LOG`.
//! Setting `GRIDSIM_PROFILE=1` turns on puffin scopes and serves them on
//! the default puffin_http port.

use std::ops::ControlFlow;

use hecs::Entity;
use tracing::{debug, info, warn};

use gridsim::components::{Direction, PendingActions};
use gridsim::{grid, queries};
use gridsim::systems::{actions, player_input};
use gridsim::{GameEngine, GameEvent, PlayerCommand, SimConfig, Zone, ZoneScheduler};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gridsim=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    info!(tick_rate = config.target_tick_rate, "starting demo zone");

    let profiling = profiling_requested(std::env::var("GRIDSIM_PROFILE").ok().as_deref());
    let _profiler = if profiling { start_profiler() } else { None };

    let mut engine = GameEngine::demo(config)?;
    engine.run_with(|zone, sched| {
        if profiling {
            puffin::GlobalProfiler::lock().new_frame();
        }
        log_events(zone);
        autopilot(zone, sched)
    });
    log_events(&mut engine.zone);

    if let Some(status) = engine.player_status() {
        info!(
            tick = engine.now(),
            level = status.level,
            experience = status.experience,
            health = status.health_remaining,
            "simulation finished"
        );
    }
    Ok(())
}

fn profiling_requested(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "0")
}

/// Turn on puffin scopes and serve them to puffin_viewer. Profiling is
/// optional, so a failed bind is only a warning.
fn start_profiler() -> Option<puffin_http::Server> {
    let addr = format!("0.0.0.0:{}", puffin_http::DEFAULT_PORT);
    match puffin_http::Server::new(&addr) {
        Ok(server) => {
            puffin::set_scopes_on(true);
            info!(%addr, "puffin profiler listening");
            Some(server)
        }
        Err(err) => {
            warn!(%err, "could not start puffin server");
            None
        }
    }
}

fn log_events(zone: &mut Zone) {
    for event in zone.events.drain() {
        match event {
            GameEvent::Message(text) => info!("{text}"),
            GameEvent::CellChanged { .. } => {}
            other => debug!(?other, "event"),
        }
    }
}

/// Walk the player to the nearest mob and fight it. Stops the run once no
/// mobs are left.
fn autopilot(zone: &mut Zone, sched: &mut ZoneScheduler) -> ControlFlow<()> {
    let Some(player) = zone.player() else {
        return ControlFlow::Break(());
    };
    let Some(target) = nearest_mob(zone, player) else {
        info!("zone cleared");
        return ControlFlow::Break(());
    };

    let busy = zone
        .world()
        .get::<&PendingActions>(player)
        .map(|p| !p.is_idle())
        .unwrap_or(true);
    if busy {
        return ControlFlow::Continue(());
    }

    if let Some(command) = next_command(zone, player, target) {
        player_input::apply_command(zone, sched, player, command);
    }
    ControlFlow::Continue(())
}

fn nearest_mob(zone: &Zone, player: Entity) -> Option<(i32, i32)> {
    let here = zone.position(player)?;
    zone.spawns()
        .filter(|&(entity, _)| queries::is_mob(zone.world(), entity))
        .map(|(_, pos)| pos)
        .min_by(|a, b| grid::distance(here, *a).total_cmp(&grid::distance(here, *b)))
}

fn next_command(zone: &Zone, player: Entity, target: (i32, i32)) -> Option<PlayerCommand> {
    if actions::faced_target(zone, player).is_some() {
        return Some(PlayerCommand::Attack);
    }
    let here = zone.position(player)?;
    // Turning toward an adjacent mob is a refused step into its cell
    let step = if grid::is_adjacent(here, target) {
        target
    } else {
        zone.next_step(here, target)?
    };
    let direction = Direction::from_delta((step.0 - here.0, step.1 - here.1))?;
    Some(PlayerCommand::Move(direction))
}
