mod config;

use anyhow::Context;
use starlane_core::controller::PlayerController;
use starlane_core::entity::components::{AutopilotTarget, ControlFlags};
use starlane_core::output::Event;
use starlane_core::scenario::Scenario;
use starlane_core::simulation::Simulation;
use tracing::{debug, info, warn};

use crate::config::HeadlessConfig;

/// Notification totals for the run summary.
#[derive(Debug, Default)]
struct Tally {
    shots: usize,
    destroyed: usize,
    contacts_gained: usize,
    contacts_lost: usize,
}

impl Tally {
    fn record(&mut self, tick: u64, event: &Event) {
        match event {
            Event::WeaponFired { turret, .. } => {
                self.shots += 1;
                debug!(tick, %turret, "weapon fired");
            }
            Event::ActorDestroyed { actor, destroyer } => {
                self.destroyed += 1;
                match destroyer {
                    Some(by) => info!(tick, %actor, %by, "actor destroyed"),
                    None => debug!(tick, %actor, "actor expired"),
                }
            }
            Event::ContactAdded { ship, contact, band } => {
                self.contacts_gained += 1;
                debug!(tick, %ship, %contact, %band, "contact gained");
            }
            Event::ContactRemoved { ship, contact, band } => {
                self.contacts_lost += 1;
                debug!(tick, %ship, %contact, %band, "contact lost");
            }
        }
    }
}

/// Pilot inputs for the scripted session, keyed by tick.
fn script(tick: u64, pilot: &mut PlayerController, scenario: &Scenario, sim: &Simulation) {
    match tick {
        0 => pilot.press(ControlFlags::THRUST),
        60 => {
            pilot.release(ControlFlags::THRUST);
            pilot.press(ControlFlags::FIRE);
        }
        180 => pilot.cycle_weapon(),
        300 => {
            pilot.release(ControlFlags::FIRE);
            let survivor = scenario
                .asteroids
                .iter()
                .find(|rock| sim.arena().get(**rock).is_some());
            if let Some(rock) = survivor {
                pilot.set_autopilot(AutopilotTarget::Actor(*rock));
            }
        }
        480 => {
            pilot.disengage_autopilot();
            pilot.press(ControlFlags::BRAKE);
        }
        _ => {}
    }
}

fn main() -> anyhow::Result<()> {
    let (level, rejected) = config::log_level();
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
    if let Some(raw) = rejected {
        warn!("Invalid STARLANE_LOG '{}', using info", raw);
    }

    info!("Starlane headless v{}", env!("CARGO_PKG_VERSION"));

    let config = HeadlessConfig::load_or_default();
    info!(
        "Configuration loaded: ticks={}, seed={}, source={}",
        config.ticks,
        config.seed,
        config
            .config_path
            .as_ref()
            .map_or_else(|| "defaults".to_string(), |p| p.display().to_string())
    );

    let mut sim = Simulation::with_config(config.sim.clone(), config.seed)
        .context("simulation config rejected")?;
    let scenario = Scenario::default_system(&mut sim).context("failed to build default system")?;
    let mut pilot = PlayerController::new(scenario.ship);
    let mut tally = Tally::default();

    for _ in 0..config.ticks {
        let tick = sim.tick();
        script(tick, &mut pilot, &scenario, &sim);
        let events = pilot
            .tick(&mut sim)
            .with_context(|| format!("pilot command failed at tick {tick}"))?;
        for event in &events {
            tally.record(tick, event);
        }
    }

    match sim.snapshot(scenario.ship) {
        Some(ship) => info!(
            x = ship.position.x,
            y = ship.position.y,
            hull = ship.hull.health,
            sector = ship.sector.as_deref().unwrap_or("none"),
            "player ship"
        ),
        None => warn!("player ship was destroyed"),
    }
    info!(
        ticks = sim.tick(),
        elapsed_ms = sim.elapsed_ms(),
        actors = sim.arena().entity_count(),
        shots = tally.shots,
        destroyed = tally.destroyed,
        contacts_gained = tally.contacts_gained,
        contacts_lost = tally.contacts_lost,
        "session complete"
    );

    Ok(())
}
