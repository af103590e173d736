//! Built-in plugins.
//!
//! - [`MovementPlugin`]: ship helm, manual flight and autopilot steering
//! - [`SensorPlugin`]: radar and visual contact scans
//! - [`TurretPlugin`]: fire control and burst sequencing
//! - [`ProjectilePlugin`]: hit checks against candidate contacts

mod movement;
mod projectile;
mod sensor;
mod turret;

pub use movement::MovementPlugin;
pub use projectile::ProjectilePlugin;
pub use sensor::SensorPlugin;
pub use turret::TurretPlugin;
