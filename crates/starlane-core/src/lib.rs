//! # Starlane Core
//!
//! Deterministic simulation core for Starlane, a 2D space sandbox with
//! orbiting bodies, a player ship, turret hardpoints and projectiles.
//!
//! This crate owns simulation state only. Rendering, UI panels and input
//! devices belong to a host, which drives the core through
//! [`controller::PlayerController`] and reads [`snapshot::ActorSnapshot`]s and
//! [`output::Event`] notifications back out.
//!
//! ## Architecture
//!
//! The core follows the Entity-Plugin-Resolver pattern:
//!
//! - **Entities**: Celestial bodies, ships, turrets, projectiles
//! - **Plugins**: Movement, turret fire control, projectile hit checks, sensors
//! - **Resolvers**: Physics, weapons, combat, contact tracking
//!
//! Actors are indexed spatially by the [`quadrant`] sector grid.
//!
//! ## Usage
//!
//! ```
//! use starlane_core::scenario::Scenario;
//! use starlane_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(7);
//! let scenario = Scenario::default_system(&mut sim).unwrap();
//!
//! sim.step_n(10);
//! assert_eq!(sim.tick(), 10);
//! assert!(sim.arena().get(scenario.ship).is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

// Re-export quadrant for sector access
pub use quadrant;

// Core modules
pub mod arena;
pub mod config;
pub mod constants;
pub mod controller;
pub mod entity;
pub mod error;
pub mod output;
pub mod plugin;
pub mod plugins;
pub mod resolver;
pub mod scenario;
pub mod simulation;
pub mod snapshot;
pub mod world_view;

pub use config::SimConfig;
pub use error::SimError;

#[cfg(test)]
mod tests;
