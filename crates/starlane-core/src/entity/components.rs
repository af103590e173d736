//! Component structs for entity state.
//!
//! Shared state (transform, hull, status) lives directly on
//! [`Entity`](super::Entity). Variant-specific state lives in the component
//! structs below, one per [`EntityInner`](super::EntityInner) variant.

use std::collections::BTreeSet;
use std::f64::consts::TAU;
use std::fmt;

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use crate::constants;

/// Timer values below this are treated as expired.
const TIMER_EPSILON_MS: f32 = 1e-3;

// =============================================================================
// Shared State
// =============================================================================

/// Position and heading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    /// World position
    pub position: Vec2,
    /// Heading in radians, 0 along +x
    pub rotation: f32,
}

impl Transform {
    /// Creates a transform.
    #[must_use]
    pub const fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    /// Unit vector along the heading.
    #[must_use]
    pub fn heading_vector(&self) -> Vec2 {
        Vec2::from_angle(self.rotation)
    }

    /// Transform of a mount at `offset` in this transform's frame.
    ///
    /// The offset is rotated by the heading; the mount shares the heading.
    #[must_use]
    pub fn mounted(&self, offset: Vec2) -> Self {
        Self {
            position: self.position + self.heading_vector().rotate(offset),
            rotation: self.rotation,
        }
    }
}

/// Structural health.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hull {
    /// Current health, never negative
    pub health: f32,
    /// Health when undamaged
    pub max: f32,
}

impl Hull {
    /// A hull at full health.
    #[must_use]
    pub const fn new(max: f32) -> Self {
        Self { health: max, max }
    }

    /// Subtracts damage, clamping at zero. Returns `true` if the hull is now depleted.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        self.health = (self.health - amount).max(0.0);
        self.is_depleted()
    }

    /// Whether health has reached zero.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.health <= 0.0
    }

    /// Health as a fraction of maximum.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.health / self.max
        } else {
            0.0
        }
    }
}

impl Default for Hull {
    fn default() -> Self {
        Self::new(100.0)
    }
}

bitflags! {
    /// Lifecycle and presentation flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StatusFlags: u8 {
        /// Marked for destruction; terminal
        const DESTROYED = 1 << 0;
        /// Selected by the host
        const SELECTED = 1 << 1;
    }
}

impl Default for StatusFlags {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// Celestial Bodies
// =============================================================================

/// What kind of body a celestial entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CelestialKind {
    /// Central star
    Sun,
    /// Large orbiting body
    Planet,
    /// Small orbiting body
    Moon,
    /// Rock with a generated outline
    Asteroid,
    /// Artificial structure
    Station,
}

impl CelestialKind {
    /// Classifies an orbiting body by size: larger than 10 is a planet.
    #[must_use]
    pub fn for_body_size(size: f32) -> Self {
        if size > 10.0 {
            Self::Planet
        } else {
            Self::Moon
        }
    }

    /// Human readable name of the kind.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sun => "Sun",
            Self::Planet => "Planet",
            Self::Moon => "Moon",
            Self::Asteroid => "Asteroid",
            Self::Station => "Station",
        }
    }
}

impl fmt::Display for CelestialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Circular orbit around another entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    /// Body being orbited
    pub parent: EntityId,
    /// Distance from the parent
    pub radius: f32,
    /// Current angle in radians, kept in [0, 2π)
    pub angle: f64,
    /// Angle advanced per tick
    pub angular_speed: f32,
}

impl Orbit {
    /// Offset from the parent at the current angle.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn offset(&self) -> Vec2 {
        Vec2::from_angle(self.angle as f32) * self.radius
    }

    /// Advances the angle by one tick.
    ///
    /// The phase is accumulated in f64: an f32 sum rounds the same way on
    /// every step and drifts far off after a few million ticks.
    pub fn advance(&mut self) {
        self.angle = (self.angle + f64::from(self.angular_speed)).rem_euclid(TAU);
    }
}

/// Components for celestial entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialComponents {
    /// Body kind
    pub kind: CelestialKind,
    /// Orbit, if the body moves around a parent
    pub orbit: Option<Orbit>,
    /// Outline the host should draw, if any
    pub shape_id: Option<u32>,
}

impl CelestialComponents {
    /// A stationary body of the given kind.
    #[must_use]
    pub const fn new(kind: CelestialKind) -> Self {
        Self {
            kind,
            orbit: None,
            shape_id: None,
        }
    }
}

// =============================================================================
// Ships
// =============================================================================

bitflags! {
    /// Movement and weapon intent held by the host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ControlFlags: u8 {
        /// Accelerate along the heading
        const THRUST = 1 << 0;
        /// Damp velocity
        const BRAKE = 1 << 1;
        /// Turn counter-clockwise
        const ROTATE_LEFT = 1 << 2;
        /// Turn clockwise
        const ROTATE_RIGHT = 1 << 3;
        /// Fire the selected hardpoint
        const FIRE = 1 << 4;
    }
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Where the autopilot is steering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AutopilotTarget {
    /// Follow an actor's live position
    Actor(EntityId),
    /// Fly to fixed coordinates
    Point(Vec2),
}

/// Velocity, control intent and autopilot state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HelmState {
    /// Velocity per tick
    pub velocity: Vec2,
    /// Intent flags from the host
    pub controls: ControlFlags,
    /// Active autopilot target
    pub autopilot: Option<AutopilotTarget>,
}

impl HelmState {
    /// Current speed per tick.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Detection band of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContactBand {
    /// Radar range
    Radar,
    /// Visual range
    Visual,
}

impl ContactBand {
    /// Both bands, radar first.
    pub const ALL: [Self; 2] = [Self::Radar, Self::Visual];
}

impl fmt::Display for ContactBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radar => write!(f, "radar"),
            Self::Visual => write!(f, "visual"),
        }
    }
}

/// Contact sets and scan schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    /// Radar band radius
    pub radar_range: f32,
    /// Visual band radius
    pub visual_range: f32,
    /// Actors within radar range at the last scan
    pub radar_contacts: BTreeSet<EntityId>,
    /// Actors within visual range at the last scan
    pub visual_contacts: BTreeSet<EntityId>,
    /// First tick on which the next scan runs
    pub next_scan_tick: u64,
}

impl SensorState {
    /// Sensor with empty contact sets that scans on the first tick.
    #[must_use]
    pub fn new(radar_range: f32, visual_range: f32) -> Self {
        Self {
            radar_range,
            visual_range,
            radar_contacts: BTreeSet::new(),
            visual_contacts: BTreeSet::new(),
            next_scan_tick: 0,
        }
    }

    /// Radius of a band.
    #[must_use]
    pub fn range(&self, band: ContactBand) -> f32 {
        match band {
            ContactBand::Radar => self.radar_range,
            ContactBand::Visual => self.visual_range,
        }
    }

    /// Contact set of a band.
    #[must_use]
    pub fn contacts(&self, band: ContactBand) -> &BTreeSet<EntityId> {
        match band {
            ContactBand::Radar => &self.radar_contacts,
            ContactBand::Visual => &self.visual_contacts,
        }
    }

    /// Mutable contact set of a band.
    pub fn contacts_mut(&mut self, band: ContactBand) -> &mut BTreeSet<EntityId> {
        match band {
            ContactBand::Radar => &mut self.radar_contacts,
            ContactBand::Visual => &mut self.visual_contacts,
        }
    }

    /// Largest band radius.
    #[must_use]
    pub fn max_range(&self) -> f32 {
        self.radar_range.max(self.visual_range)
    }
}

impl Default for SensorState {
    fn default() -> Self {
        Self::new(constants::RADAR_RANGE, constants::VISUAL_RANGE)
    }
}

/// Turrets mounted on a ship and the one selected for firing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hardpoints {
    /// Mounted turrets in mount order
    pub mounts: Vec<EntityId>,
    /// Index into `mounts` of the selected turret
    pub selected: usize,
}

impl Hardpoints {
    /// The selected turret, if any are mounted.
    #[must_use]
    pub fn selected_mount(&self) -> Option<EntityId> {
        self.mounts.get(self.selected).copied()
    }

    /// Selects the next turret, wrapping around.
    pub fn cycle(&mut self) {
        if self.mounts.is_empty() {
            self.selected = 0;
        } else {
            self.selected = (self.selected + 1) % self.mounts.len();
        }
    }

    /// Mounts a turret.
    pub fn attach(&mut self, turret: EntityId) {
        if !self.mounts.contains(&turret) {
            self.mounts.push(turret);
        }
    }

    /// Unmounts a turret, keeping the selection in range.
    pub fn detach(&mut self, turret: EntityId) {
        self.mounts.retain(|mount| *mount != turret);
        if self.selected >= self.mounts.len() {
            self.selected = 0;
        }
    }
}

/// Components for ship entities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShipComponents {
    /// Velocity and intent
    pub helm: HelmState,
    /// Contact tracking
    pub sensor: SensorState,
    /// Mounted turrets
    pub hardpoints: Hardpoints,
}

// =============================================================================
// Turrets
// =============================================================================

/// How damage interacts with a hull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageKind {
    /// Subtracted from hull health
    Kinetic,
    /// Recognized but has no effect on hulls
    Energy,
}

/// Static description of a turret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurretSpec {
    /// Display name
    pub name: String,
    /// Cooldown after a burst completes
    pub recoil_ms: f32,
    /// Shots per trigger pull
    pub projectiles_per_burst: u32,
    /// Time between shots within a burst
    pub burst_delay_ms: f32,
    /// Projectile kill distance
    pub range: f32,
    /// Percentage, 100 fires dead straight
    pub accuracy: f32,
    /// Mount position relative to the owner, in the owner's frame
    pub mount_offset: Vec2,
    /// Projectile speed per tick before the owner's speed is added
    pub projectile_speed: f32,
    /// Damage per projectile
    pub damage: f32,
    /// Damage kind per projectile
    pub damage_kind: DamageKind,
}

impl TurretSpec {
    /// Largest deviation of a shot from the turret heading.
    #[must_use]
    pub fn spread(&self, max_spread: f32) -> f32 {
        max_spread * (1.0 - (self.accuracy / 100.0).clamp(0.0, 1.0))
    }

    /// Shots per burst, at least one.
    #[must_use]
    pub fn shots(&self) -> u32 {
        self.projectiles_per_burst.max(1)
    }
}

/// Recoil countdown and burst bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TurretCooldown {
    /// Time until the turret may start a new burst
    pub countdown_ms: f32,
    /// Countdown set by the last burst, for display fractions
    pub cycle_ms: f32,
    /// Shots still to fire in the current burst
    pub burst_remaining: u32,
    /// Time until the next shot of the current burst
    pub burst_timer_ms: f32,
}

impl TurretCooldown {
    /// Registers the first shot of a burst.
    ///
    /// The countdown covers the rest of the burst plus the recoil interval.
    #[allow(clippy::cast_precision_loss)]
    pub fn begin_burst(&mut self, spec: &TurretSpec) {
        let follow_ups = spec.shots() - 1;
        self.countdown_ms = follow_ups as f32 * spec.burst_delay_ms + spec.recoil_ms;
        self.cycle_ms = self.countdown_ms;
        self.burst_remaining = follow_ups;
        self.burst_timer_ms = spec.burst_delay_ms;
    }

    /// Registers a follow-up shot of the current burst.
    pub fn burst_shot(&mut self, spec: &TurretSpec) {
        self.burst_remaining = self.burst_remaining.saturating_sub(1);
        self.burst_timer_ms += spec.burst_delay_ms;
    }

    /// Runs the timers down by `dt_ms`, never below zero.
    pub fn advance(&mut self, dt_ms: f32) {
        self.countdown_ms -= dt_ms;
        if self.countdown_ms < TIMER_EPSILON_MS {
            self.countdown_ms = 0.0;
        }
        if self.burst_remaining > 0 {
            self.burst_timer_ms -= dt_ms;
            if self.burst_timer_ms < TIMER_EPSILON_MS {
                self.burst_timer_ms = 0.0;
            }
        } else {
            self.burst_timer_ms = 0.0;
        }
    }

    /// Whether a follow-up shot of the current burst is due.
    #[must_use]
    pub fn burst_shot_due(&self) -> bool {
        self.burst_remaining > 0 && self.burst_timer_ms <= 0.0
    }

    /// Whether a new burst may start.
    #[must_use]
    pub fn can_fire(&self) -> bool {
        self.countdown_ms <= 0.0 && self.burst_remaining == 0
    }

    /// Countdown as a fraction of the last cycle, 0 when ready.
    #[must_use]
    pub fn remaining_recoil_fraction(&self) -> f32 {
        if self.cycle_ms > 0.0 {
            (self.countdown_ms / self.cycle_ms).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Whether the countdown still holds part of a burst on top of the recoil.
    #[must_use]
    pub fn is_overheated(&self, spec: &TurretSpec) -> bool {
        self.countdown_ms > spec.recoil_ms
    }
}

/// Components for turret entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurretComponents {
    /// Ship the turret is mounted on
    pub owner: EntityId,
    /// Static description
    pub spec: TurretSpec,
    /// Whether the turret is currently trying to fire
    pub firing: bool,
    /// Timers
    pub cooldown: TurretCooldown,
}

impl TurretComponents {
    /// An idle turret ready to fire.
    #[must_use]
    pub fn new(owner: EntityId, spec: TurretSpec) -> Self {
        Self {
            owner,
            spec,
            firing: false,
            cooldown: TurretCooldown::default(),
        }
    }
}

// =============================================================================
// Projectiles
// =============================================================================

/// Components for projectile entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileComponents {
    /// Velocity per tick, fixed at launch
    pub velocity: Vec2,
    /// Speed per tick
    pub speed: f32,
    /// Launch point
    pub origin: Vec2,
    /// Distance from `origin` at which the projectile expires
    pub kill_distance: f32,
    /// Damage on hit
    pub damage: f32,
    /// Damage kind on hit
    pub damage_kind: DamageKind,
    /// Ship that fired
    pub owner: EntityId,
    /// Turret that fired
    pub turret: EntityId,
    /// Candidate targets, narrowed at every hit check
    pub contacts: Vec<EntityId>,
    /// First tick on which the next hit check runs
    pub next_hit_check_tick: u64,
}

impl ProjectileComponents {
    /// Distance travelled from the launch point.
    #[must_use]
    pub fn traveled(&self, position: Vec2) -> f32 {
        self.origin.distance(position)
    }

    /// Distance left before expiry, never negative.
    #[must_use]
    pub fn remaining_range(&self, position: Vec2) -> f32 {
        (self.kill_distance - self.traveled(position)).max(0.0)
    }

    /// Whether the projectile has reached its kill distance.
    #[must_use]
    pub fn is_spent(&self, position: Vec2) -> bool {
        self.traveled(position) >= self.kill_distance
    }
}
