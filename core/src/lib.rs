#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the horde director.
//!
//! This crate defines the value types that connect the encounter catalog, the
//! performance tracker, and the wave director. Templates ([`EnemyType`],
//! [`WavePhase`], [`SpecialWave`]) are immutable records loaded from data or
//! built in code. The director turns them into [`SpawnRequest`] values for the
//! host to instantiate and reports progress by broadcasting [`Event`] values.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lower bound applied to every difficulty multiplier.
pub const MIN_DIFFICULTY_MULTIPLIER: f32 = 0.5;

/// Upper bound applied to every difficulty multiplier.
pub const MAX_DIFFICULTY_MULTIPLIER: f32 = 2.0;

/// Unique identifier assigned to an enemy template.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EnemyTypeId(u32);

impl EnemyTypeId {
    /// Creates a new enemy template identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a scripted special wave.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SpecialWaveId(u32);

impl SpecialWaveId {
    /// Creates a new special wave identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Opaque handle the host hands back for every instantiated entity.
///
/// The director never owns the entity behind a handle; it only tracks the
/// handle for alive-count and wave-completion checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(u64);

impl EntityHandle {
    /// Creates a new entity handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Boolean archetype tags attached to enemy templates.
///
/// Phases reuse the same shape to express which archetypes they prefer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchetypeTags {
    /// Quick, lightly armoured enemies.
    pub fast: bool,
    /// Enemies with damage reduction.
    pub armored: bool,
    /// Slow, high-health enemies.
    pub tank: bool,
    /// Boss-class enemies.
    pub boss: bool,
}

impl ArchetypeTags {
    /// Tags with every archetype cleared.
    pub const NONE: Self = Self {
        fast: false,
        armored: false,
        tank: false,
        boss: false,
    };

    /// Counts the archetypes set in both `self` and `other`.
    #[must_use]
    pub fn shared_with(&self, other: &Self) -> u32 {
        u32::from(self.fast && other.fast)
            + u32::from(self.armored && other.armored)
            + u32::from(self.tank && other.tank)
            + u32::from(self.boss && other.boss)
    }

    /// Reports whether no archetype is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// Stats that scale with the wave number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatKind {
    /// Hit points.
    Health,
    /// Movement speed in world units per second.
    Speed,
    /// Contact damage per hit.
    Damage,
}

/// Unscaled combat stats of an enemy template.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    /// Hit points at wave 1.
    pub health: f32,
    /// Movement speed at wave 1.
    pub speed: f32,
    /// Contact damage at wave 1.
    pub damage: f32,
    /// Seconds between two contact hits.
    pub contact_cooldown: f32,
    /// Radius within which contact damage applies.
    pub contact_radius: f32,
}

impl BaseStats {
    /// Returns the base value of the requested scalable stat.
    #[must_use]
    pub const fn get(&self, kind: StatKind) -> f32 {
        match kind {
            StatKind::Health => self.health,
            StatKind::Speed => self.speed,
            StatKind::Damage => self.damage,
        }
    }
}

/// Linear per-wave scaling coefficients.
///
/// Each coefficient is multiplied by `wave - 1` and added to the base stat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatScaling {
    /// Health gained per wave after the first.
    pub health: f32,
    /// Speed gained per wave after the first.
    pub speed: f32,
    /// Damage gained per wave after the first.
    pub damage: f32,
}

impl StatScaling {
    /// Returns the scaling coefficient for the requested stat.
    #[must_use]
    pub const fn coefficient(&self, kind: StatKind) -> f32 {
        match kind {
            StatKind::Health => self.health,
            StatKind::Speed => self.speed,
            StatKind::Damage => self.damage,
        }
    }
}

/// Colour multiplier forwarded to the host when an enemy is instantiated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Tint {
    red: u8,
    green: u8,
    blue: u8,
}

impl Tint {
    /// Neutral tint that leaves the host's material untouched.
    pub const WHITE: Self = Self::from_rgb(0xff, 0xff, 0xff);

    /// Creates a new tint from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the tint.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the tint.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the tint.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[u8; 3]> for Tint {
    fn from([red, green, blue]: [u8; 3]) -> Self {
        Self::from_rgb(red, green, blue)
    }
}

impl From<Tint> for [u8; 3] {
    fn from(tint: Tint) -> Self {
        [tint.red, tint.green, tint.blue]
    }
}

/// Purely visual parameters of an enemy template.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cosmetics {
    /// Colour multiplier applied to the spawned entity.
    pub tint: Tint,
    /// Uniform scale multiplier applied to the spawned entity.
    pub scale: f32,
}

impl Default for Cosmetics {
    fn default() -> Self {
        Self {
            tint: Tint::WHITE,
            scale: 1.0,
        }
    }
}

/// Immutable description of a spawnable enemy archetype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyType {
    /// Identifier referenced by phases and pools.
    pub id: EnemyTypeId,
    /// Human readable name.
    pub name: String,
    /// Budget points deducted when the enemy spawns. Always positive.
    pub spawn_cost: u32,
    /// Relative selection likelihood. Always positive.
    pub spawn_weight: f32,
    /// First wave (inclusive) the enemy may appear in.
    #[serde(default = "first_wave")]
    pub min_wave: u32,
    /// Last wave (inclusive) the enemy may appear in; `None` is unbounded.
    #[serde(default)]
    pub max_wave: Option<u32>,
    /// Stats at wave 1.
    pub stats: BaseStats,
    /// Linear per-wave scaling coefficients.
    #[serde(default)]
    pub scaling: StatScaling,
    /// Archetype tags used by phase preferences.
    #[serde(default)]
    pub tags: ArchetypeTags,
    /// Visual parameters forwarded to the host.
    #[serde(default)]
    pub cosmetics: Cosmetics,
}

const fn first_wave() -> u32 {
    1
}

/// Cadence patterns a phase may use to schedule spawns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPattern {
    /// One spawn per interval.
    Steady,
    /// Sparse, probabilistic clusters.
    Burst,
    /// A single spawn per phase.
    AllAtOnce,
    /// Interval breathing with a sine wave over phase time.
    Pulsing,
    /// Interval shrinking as the phase progresses.
    Escalating,
    /// Interval jittered by a fresh uniform draw on every check.
    Random,
}

/// Placement zones relative to the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnZone {
    /// Any direction on the ground plane.
    Random,
    /// Ahead of the player (+Z).
    Front,
    /// Behind the player (-Z).
    Behind,
    /// Left or right of the player (±X), chosen with equal probability.
    Sides,
    /// Uniform angle around the player.
    Surrounding,
}

/// Timed sub-segment of a wave with its own cadence, cap and placement rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WavePhase {
    /// Display name of the phase.
    pub name: String,
    /// Length of the phase in seconds.
    pub duration: f32,
    /// Cadence pattern evaluated every tick.
    pub pattern: SpawnPattern,
    /// Nominal spawns per second.
    pub spawn_rate: f32,
    /// Cap on simultaneously alive enemies.
    pub max_enemies_alive: u32,
    /// Enemy templates allowed in this phase; empty falls back to the default pool.
    #[serde(default)]
    pub allowed_enemy_types: Vec<EnemyTypeId>,
    /// Archetypes whose selection weight is doubled during the phase.
    #[serde(default)]
    pub preferences: ArchetypeTags,
    /// Zones a spawn may be placed in.
    pub spawn_locations: Vec<SpawnZone>,
    /// Minimum distance between player and spawn point.
    pub min_spawn_distance: f32,
    /// Maximum distance between player and spawn point.
    pub max_spawn_distance: f32,
    /// Text announced when the phase starts; empty means silent.
    #[serde(default)]
    pub message: String,
}

impl WavePhase {
    /// Seconds between two nominal spawns.
    #[must_use]
    pub fn spawn_interval(&self) -> f32 {
        1.0 / self.spawn_rate
    }

    /// Checks the phase invariants that placement and timing rely on.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.spawn_locations.is_empty() {
            return Err(ConfigurationError::NoSpawnLocations {
                phase: self.name.clone(),
            });
        }

        let distances_valid = self.min_spawn_distance.is_finite()
            && self.max_spawn_distance.is_finite()
            && self.min_spawn_distance > 0.0
            && self.min_spawn_distance <= self.max_spawn_distance;
        if !distances_valid {
            return Err(ConfigurationError::InvalidSpawnDistance {
                phase: self.name.clone(),
                min: self.min_spawn_distance,
                max: self.max_spawn_distance,
            });
        }

        let timing_valid = self.duration.is_finite()
            && self.duration > 0.0
            && self.spawn_rate.is_finite()
            && self.spawn_rate > 0.0;
        if !timing_valid {
            return Err(ConfigurationError::InvalidPhaseTiming {
                phase: self.name.clone(),
                duration: self.duration,
                spawn_rate: self.spawn_rate,
            });
        }

        Ok(())
    }
}

/// Four multiplicative modifiers applied to spawned enemies and spawn density.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatMultipliers {
    /// Health multiplier.
    pub health: f32,
    /// Speed multiplier.
    pub speed: f32,
    /// Damage multiplier.
    pub damage: f32,
    /// Spawn rate (or budget) multiplier.
    pub spawn_rate: f32,
}

impl StatMultipliers {
    /// Multipliers that leave every value unchanged.
    pub const NEUTRAL: Self = Self {
        health: 1.0,
        speed: 1.0,
        damage: 1.0,
        spawn_rate: 1.0,
    };

    /// Returns the multiplier for a scalable stat.
    #[must_use]
    pub const fn for_stat(&self, kind: StatKind) -> f32 {
        match kind {
            StatKind::Health => self.health,
            StatKind::Speed => self.speed,
            StatKind::Damage => self.damage,
        }
    }

    /// Arithmetic mean of the four multipliers.
    #[must_use]
    pub fn mean(&self) -> f32 {
        (self.health + self.speed + self.damage + self.spawn_rate) / 4.0
    }

    /// Adds `delta` to every multiplier and clamps the result into `[min, max]`.
    ///
    /// Never panics: an inverted or NaN bound is applied as a plain floor and
    /// ceiling, with the ceiling taking precedence.
    #[must_use]
    pub fn nudged(&self, delta: f32, min: f32, max: f32) -> Self {
        let apply = |value: f32| (value + delta).max(min).min(max);
        Self {
            health: apply(self.health),
            speed: apply(self.speed),
            damage: apply(self.damage),
            spawn_rate: apply(self.spawn_rate),
        }
    }
}

impl Default for StatMultipliers {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Scripted, multi-phase wave variant with global stat modifiers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecialWave {
    /// Identifier of the special wave.
    pub id: SpecialWaveId,
    /// Display name announced when the wave starts.
    pub name: String,
    /// First wave the special wave may be rolled for.
    pub min_wave_to_appear: u32,
    /// Relative selection likelihood among eligible special waves.
    pub selection_weight: f32,
    /// Ordered phases, iterated exactly once per occurrence.
    #[serde(rename = "phase")]
    pub phases: Vec<WavePhase>,
    /// Global modifiers applied on top of per-enemy scaling.
    #[serde(default)]
    pub modifiers: StatMultipliers,
}

/// Final stats the host applies to a freshly spawned entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnStats {
    /// Hit points.
    pub health: f32,
    /// Movement speed.
    pub speed: f32,
    /// Contact damage per hit.
    pub damage: f32,
    /// Seconds between two contact hits.
    pub contact_cooldown: f32,
    /// Radius within which contact damage applies.
    pub contact_radius: f32,
}

/// Instruction to instantiate an enemy, handed to the host.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    /// Template the entity is built from.
    pub enemy: EnemyTypeId,
    /// Wave the spawn belongs to.
    pub wave: u32,
    /// World position with height pinned to ground level.
    pub position: Vec3,
    /// Scaled stats.
    pub stats: SpawnStats,
    /// Visual parameters copied from the template.
    pub cosmetics: Cosmetics,
}

/// Aggregated outcome of one completed wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerformanceSample {
    /// Seconds between wave start and completion.
    pub clear_time: f32,
    /// Player health at completion, in percent (0–100).
    pub final_health_pct: f32,
    /// Damage the player took during the wave.
    pub damage_taken: f32,
    /// Kills per minute over the wave.
    pub kills_per_minute: f32,
}

/// Summary broadcast when a wave completes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveReport {
    /// Sample recorded into the performance tracker.
    pub sample: PerformanceSample,
    /// Kills credited to the wave.
    pub kills: u32,
    /// Composite performance score after recording the sample.
    pub performance: f32,
    /// Difficulty multipliers the next wave will use.
    pub difficulty: StatMultipliers,
}

/// Notifications broadcast by the wave director.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A new wave began.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
        /// Point budget granted to the wave.
        budget: i32,
    },
    /// The wave rolled a scripted special wave.
    SpecialWaveStarted {
        /// One-based wave number.
        wave: u32,
        /// Identifier of the selected template.
        id: SpecialWaveId,
        /// Display name of the selected template.
        name: String,
    },
    /// A phase became active.
    PhaseStarted {
        /// One-based wave number.
        wave: u32,
        /// Zero-based phase index within the wave.
        index: usize,
        /// Display name of the phase.
        name: String,
    },
    /// A phase announced its start message.
    PhaseMessage {
        /// Text to present to the player.
        text: String,
    },
    /// The host instantiated an enemy on the director's behalf.
    EnemySpawned {
        /// Handle returned by the host.
        handle: EntityHandle,
        /// Template the enemy was built from.
        enemy: EnemyTypeId,
    },
    /// A wave finished and its metrics were recorded.
    WaveCompleted {
        /// One-based wave number.
        wave: u32,
        /// Aggregated wave metrics.
        report: WaveReport,
    },
}

/// Unrecoverable template configuration detected at phase start.
///
/// The director recovers from every variant by substituting its synthesized
/// default phase.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigurationError {
    /// A special wave without phases was selected.
    #[error("special wave `{wave}` has no phases")]
    NoPhases {
        /// Name of the offending special wave.
        wave: String,
    },
    /// A phase lists no spawn zones.
    #[error("phase `{phase}` has no spawn locations")]
    NoSpawnLocations {
        /// Name of the offending phase.
        phase: String,
    },
    /// A phase spawn distance range is empty, inverted or non-positive.
    #[error("phase `{phase}` has invalid spawn distance range {min}..={max}")]
    InvalidSpawnDistance {
        /// Name of the offending phase.
        phase: String,
        /// Configured minimum distance.
        min: f32,
        /// Configured maximum distance.
        max: f32,
    },
    /// A phase has a non-positive duration or spawn rate.
    #[error("phase `{phase}` has invalid timing (duration {duration}, rate {spawn_rate})")]
    InvalidPhaseTiming {
        /// Name of the offending phase.
        phase: String,
        /// Configured duration.
        duration: f32,
        /// Configured spawn rate.
        spawn_rate: f32,
    },
    /// A template references an enemy type the catalog does not contain.
    #[error("enemy type {id:?} is not in the catalog")]
    UnknownEnemyType {
        /// Identifier that failed to resolve.
        id: EnemyTypeId,
    },
}

/// Failure of a weighted selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The candidate list was empty after filtering.
    #[error("no eligible candidate to select from")]
    NoEligibleCandidate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase() -> WavePhase {
        WavePhase {
            name: "Opening".to_owned(),
            duration: 10.0,
            pattern: SpawnPattern::Steady,
            spawn_rate: 2.0,
            max_enemies_alive: 5,
            allowed_enemy_types: Vec::new(),
            preferences: ArchetypeTags::NONE,
            spawn_locations: vec![SpawnZone::Front],
            min_spawn_distance: 10.0,
            max_spawn_distance: 20.0,
            message: String::new(),
        }
    }

    #[test]
    fn shared_tags_count_overlap() {
        let runner = ArchetypeTags {
            fast: true,
            armored: true,
            ..ArchetypeTags::NONE
        };
        let preference = ArchetypeTags {
            fast: true,
            boss: true,
            ..ArchetypeTags::NONE
        };
        assert_eq!(runner.shared_with(&preference), 1);
        assert_eq!(runner.shared_with(&ArchetypeTags::NONE), 0);
        assert!(ArchetypeTags::default().is_empty());
    }

    #[test]
    fn nudged_multipliers_stay_clamped() {
        let raised = StatMultipliers::NEUTRAL.nudged(5.0, 0.5, 2.0);
        assert_eq!(raised.health, 2.0);
        assert_eq!(raised.spawn_rate, 2.0);

        let lowered = StatMultipliers::NEUTRAL.nudged(-5.0, 0.5, 2.0);
        assert_eq!(lowered.mean(), 0.5);
    }

    #[test]
    fn nudged_tolerates_inverted_and_nan_bounds() {
        let inverted = StatMultipliers::NEUTRAL.nudged(0.1, 3.0, 1.0);
        assert_eq!(inverted.health, 1.0);

        let unbounded = StatMultipliers::NEUTRAL.nudged(0.25, f32::NAN, f32::NAN);
        assert_eq!(unbounded.speed, 1.25);
    }

    #[test]
    fn phase_validation_rejects_bad_configuration() {
        assert!(phase().validate().is_ok());

        let mut no_zones = phase();
        no_zones.spawn_locations.clear();
        assert!(matches!(
            no_zones.validate(),
            Err(ConfigurationError::NoSpawnLocations { .. })
        ));

        let mut inverted = phase();
        inverted.min_spawn_distance = 30.0;
        assert!(matches!(
            inverted.validate(),
            Err(ConfigurationError::InvalidSpawnDistance { .. })
        ));

        let mut stalled = phase();
        stalled.spawn_rate = 0.0;
        assert!(matches!(
            stalled.validate(),
            Err(ConfigurationError::InvalidPhaseTiming { .. })
        ));
    }

    #[test]
    fn spawn_interval_is_reciprocal_rate() {
        assert!((phase().spawn_interval() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn enemy_template_parses_with_defaults() {
        let source = r#"
            id = 7
            name = "Runner"
            spawn_cost = 3
            spawn_weight = 4.5
            max_wave = 12

            [stats]
            health = 20.0
            speed = 6.0
            damage = 4.0
            contact_cooldown = 0.8
            contact_radius = 1.2

            [tags]
            fast = true

            [cosmetics]
            tint = [255, 200, 0]
        "#;
        let enemy: EnemyType = toml::from_str(source).expect("enemy template parses");

        assert_eq!(enemy.id, EnemyTypeId::new(7));
        assert_eq!(enemy.min_wave, 1);
        assert_eq!(enemy.max_wave, Some(12));
        assert_eq!(enemy.scaling, StatScaling::default());
        assert!(enemy.tags.fast && !enemy.tags.boss);
        assert_eq!(enemy.cosmetics.tint, Tint::from_rgb(255, 200, 0));
        assert!((enemy.cosmetics.scale - 1.0).abs() < f32::EPSILON);
    }
}
