//! Simulation configuration.
//!
//! Every field has a default taken from [`crate::constants`], so a JSON file
//! only needs to name the values it overrides:
//!
//! ```
//! use starlane_core::SimConfig;
//!
//! let config = SimConfig::from_json_str(r#"{ "sensor": { "radar_range": 300.0 } }"#).unwrap();
//! assert_eq!(config.sensor.radar_range, 300.0);
//! assert_eq!(config.sensor.visual_range, 450.0);
//! ```

use quadrant::SectorConfig;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::SimError;

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Length of one tick in milliseconds
    pub tick_ms: f32,
    /// Sector grid settings
    pub sectors: SectorConfig,
    /// Manual ship handling
    pub ship: ShipTuning,
    /// Autopilot behaviour
    pub autopilot: AutopilotTuning,
    /// Contact tracking
    pub sensor: SensorTuning,
    /// Projectile hit checks
    pub projectile: ProjectileTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_ms: constants::TICK_MS,
            sectors: SectorConfig::default(),
            ship: ShipTuning::default(),
            autopilot: AutopilotTuning::default(),
            sensor: SensorTuning::default(),
            projectile: ProjectileTuning::default(),
        }
    }
}

/// Per-tick ship handling values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipTuning {
    /// Heading change per tick while rotating
    pub rotation_step: f32,
    /// Acceleration per tick while thrusting
    pub thrust: f32,
    /// Fraction of thrust removed from velocity per tick while braking
    pub brake_factor: f32,
    /// Velocity components below this snap to zero while braking
    pub velocity_snap: f32,
    /// Speed cap
    pub max_speed: f32,
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            rotation_step: constants::ROTATION_STEP,
            thrust: constants::THRUST,
            brake_factor: constants::BRAKE_FACTOR,
            velocity_snap: constants::VELOCITY_SNAP,
            max_speed: constants::MAX_SPEED,
        }
    }
}

/// Autopilot steering values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotTuning {
    /// Heading change per tick
    pub heading_step: f32,
    /// Heading error below which the autopilot thrusts
    pub alignment_threshold: f32,
    /// Distance at which thrust stops and velocity is damped
    pub decelerate_radius: f32,
    /// Distance at which the autopilot disengages
    pub arrival_radius: f32,
    /// Velocity multiplier per tick while decelerating
    pub damping: f32,
}

impl Default for AutopilotTuning {
    fn default() -> Self {
        Self {
            heading_step: constants::AUTOPILOT_HEADING_STEP,
            alignment_threshold: constants::AUTOPILOT_ALIGNMENT,
            decelerate_radius: constants::AUTOPILOT_DECELERATE_RADIUS,
            arrival_radius: constants::AUTOPILOT_ARRIVAL_RADIUS,
            damping: constants::AUTOPILOT_DAMPING,
        }
    }
}

/// Contact tracking values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorTuning {
    /// Radar band radius
    pub radar_range: f32,
    /// Visual band radius
    pub visual_range: f32,
    /// Time between rescans
    pub scan_interval_ms: f32,
}

impl Default for SensorTuning {
    fn default() -> Self {
        Self {
            radar_range: constants::RADAR_RANGE,
            visual_range: constants::VISUAL_RANGE,
            scan_interval_ms: constants::SCAN_INTERVAL_MS,
        }
    }
}

/// Projectile hit check values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Hit distance added to the target's size
    pub hit_radius: f32,
    /// Ticks between hit checks
    pub hit_check_interval_ticks: u64,
    /// Largest shot deviation at 0% accuracy
    pub max_spread: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            hit_radius: constants::HIT_RADIUS,
            hit_check_interval_ticks: constants::HIT_CHECK_INTERVAL_TICKS,
            max_spread: constants::MAX_SPREAD,
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ConfigParse`] for malformed JSON and
    /// [`SimError::InvalidConfig`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), SimError> {
        positive("tick_ms", self.tick_ms)?;
        positive("sectors.cell_size", self.sectors.cell_size)?;
        positive("sectors.min_subdivide_size", self.sectors.min_subdivide_size)?;
        positive("sensor.scan_interval_ms", self.sensor.scan_interval_ms)?;
        positive("ship.max_speed", self.ship.max_speed)?;
        positive("autopilot.heading_step", self.autopilot.heading_step)?;

        non_negative("ship.rotation_step", self.ship.rotation_step)?;
        non_negative("ship.thrust", self.ship.thrust)?;
        non_negative("ship.brake_factor", self.ship.brake_factor)?;
        non_negative("ship.velocity_snap", self.ship.velocity_snap)?;
        non_negative("autopilot.alignment_threshold", self.autopilot.alignment_threshold)?;
        non_negative("autopilot.decelerate_radius", self.autopilot.decelerate_radius)?;
        non_negative("autopilot.arrival_radius", self.autopilot.arrival_radius)?;
        non_negative("autopilot.damping", self.autopilot.damping)?;
        non_negative("sensor.radar_range", self.sensor.radar_range)?;
        non_negative("sensor.visual_range", self.sensor.visual_range)?;
        non_negative("projectile.hit_radius", self.projectile.hit_radius)?;
        non_negative("projectile.max_spread", self.projectile.max_spread)?;

        if self.projectile.hit_check_interval_ticks == 0 {
            return Err(SimError::InvalidConfig(
                "projectile.hit_check_interval_ticks must be at least 1".to_string(),
            ));
        }
        if self.autopilot.arrival_radius > self.autopilot.decelerate_radius {
            return Err(SimError::InvalidConfig(
                "autopilot.arrival_radius must not exceed autopilot.decelerate_radius".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of ticks covering `ms` milliseconds, rounded up, at least one.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn ticks_for_ms(&self, ms: f32) -> u64 {
        // Tolerance keeps exact multiples (250 ms at 60 Hz) from rounding up
        let ticks = (f64::from(ms) / f64::from(self.tick_ms) - 1e-6).ceil();
        if ticks < 1.0 {
            1
        } else {
            ticks as u64
        }
    }
}

fn positive(field: &str, value: f32) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!("{field} must be positive, got {value}")))
    }
}

fn non_negative(field: &str, value: f32) -> Result<(), SimError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!("{field} must be non-negative, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod default_tests {
        use super::*;

        #[test]
        fn defaults_are_valid() {
            assert!(SimConfig::default().validate().is_ok());
        }

        #[test]
        fn defaults_match_constants() {
            let config = SimConfig::default();
            assert_eq!(config.sensor.radar_range, 250.0);
            assert_eq!(config.sensor.visual_range, 450.0);
            assert_eq!(config.ship.max_speed, 2.4);
            assert_eq!(config.projectile.hit_check_interval_ticks, 2);
            assert_eq!(config.sectors.cell_size, 2050.0);
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn empty_object_gives_defaults() {
            let config = SimConfig::from_json_str("{}").unwrap();
            assert_eq!(config, SimConfig::default());
        }

        #[test]
        fn nested_override() {
            let config =
                SimConfig::from_json_str(r#"{ "sectors": { "max_actors_per_sector": 8 } }"#).unwrap();
            assert_eq!(config.sectors.max_actors_per_sector, Some(8));
            assert_eq!(config.sectors.cell_size, 2050.0);
        }

        #[test]
        fn malformed_json_is_parse_error() {
            let err = SimConfig::from_json_str("{ tick_ms: ").unwrap_err();
            assert!(matches!(err, SimError::ConfigParse(_)));
        }

        #[test]
        fn invalid_value_is_rejected() {
            let err = SimConfig::from_json_str(r#"{ "tick_ms": 0.0 }"#).unwrap_err();
            assert!(matches!(err, SimError::InvalidConfig(ref msg) if msg.contains("tick_ms")));
        }

        #[test]
        fn roundtrip() {
            let config = SimConfig::default();
            let json = serde_json::to_string(&config).unwrap();
            assert_eq!(SimConfig::from_json_str(&json).unwrap(), config);
        }
    }

    mod validate_tests {
        use super::*;

        #[test]
        fn negative_range_rejected() {
            let mut config = SimConfig::default();
            config.sensor.radar_range = -1.0;
            assert!(config.validate().is_err());
        }

        #[test]
        fn zero_hit_interval_rejected() {
            let mut config = SimConfig::default();
            config.projectile.hit_check_interval_ticks = 0;
            assert!(config.validate().is_err());
        }

        #[test]
        fn arrival_outside_deceleration_rejected() {
            let mut config = SimConfig::default();
            config.autopilot.arrival_radius = 80.0;
            assert!(config.validate().is_err());
        }
    }

    mod ticks_for_ms_tests {
        use super::*;

        #[test]
        fn exact_multiple() {
            let config = SimConfig::default();
            assert_eq!(config.ticks_for_ms(250.0), 15);
        }

        #[test]
        fn rounds_up() {
            let config = SimConfig {
                tick_ms: 10.0,
                ..SimConfig::default()
            };
            assert_eq!(config.ticks_for_ms(25.0), 3);
        }

        #[test]
        fn at_least_one() {
            let config = SimConfig::default();
            assert_eq!(config.ticks_for_ms(0.0), 1);
            assert_eq!(config.ticks_for_ms(1.0), 1);
        }
    }
}
