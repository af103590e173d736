//! Default tuning values.
//!
//! Distances are world units, angles radians, timers milliseconds. Ship and
//! autopilot values are per tick.

use std::f32::consts::PI;

// =============================================================================
// Clock
// =============================================================================

/// Length of one simulation tick (60 ticks per second).
pub const TICK_MS: f32 = 1000.0 / 60.0;

// =============================================================================
// Ship kinematics
// =============================================================================

/// Heading change per tick while a rotate key is held.
pub const ROTATION_STEP: f32 = 0.1;
/// Acceleration per tick while thrusting.
pub const THRUST: f32 = 0.1;
/// Fraction of `THRUST` removed from velocity per tick while braking.
pub const BRAKE_FACTOR: f32 = 0.1;
/// Velocity components below this snap to zero while braking.
pub const VELOCITY_SNAP: f32 = 0.01;
/// Maximum ship speed per tick.
pub const MAX_SPEED: f32 = 2.4;

// =============================================================================
// Autopilot
// =============================================================================

/// Heading change per tick while the autopilot steers.
pub const AUTOPILOT_HEADING_STEP: f32 = 0.1;
/// Heading error below which the autopilot thrusts.
pub const AUTOPILOT_ALIGNMENT: f32 = 0.1;
/// Inside this distance the autopilot stops thrusting and damps velocity.
pub const AUTOPILOT_DECELERATE_RADIUS: f32 = 50.0;
/// Inside this distance the autopilot disengages.
pub const AUTOPILOT_ARRIVAL_RADIUS: f32 = 5.0;
/// Velocity multiplier per tick while decelerating.
pub const AUTOPILOT_DAMPING: f32 = 0.95;

// =============================================================================
// Sensors
// =============================================================================

/// Radar contact radius.
pub const RADAR_RANGE: f32 = 250.0;
/// Visual contact radius.
pub const VISUAL_RANGE: f32 = 450.0;
/// Interval between contact rescans.
pub const SCAN_INTERVAL_MS: f32 = 250.0;

// =============================================================================
// Projectiles
// =============================================================================

/// Base hit distance added to the target's size.
pub const HIT_RADIUS: f32 = 5.0;
/// Ticks between projectile hit checks.
pub const HIT_CHECK_INTERVAL_TICKS: u64 = 2;
/// Largest angular deviation of a shot from a 0% accuracy turret.
pub const MAX_SPREAD: f32 = PI / 18.0;
