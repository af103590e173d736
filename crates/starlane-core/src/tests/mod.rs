//! Crate-level tests that drive the full simulation.
//!
//! - `determinism.rs`: same seed and inputs produce identical runs
//! - `integration.rs`: end-to-end flight, orbit, combat and contact scenarios
//! - `properties.rs`: proptest checks of sector membership and contact sets
//! - `helpers.rs`: setup utilities shared by the above

mod determinism;
mod helpers;

pub use helpers::*;
