//! Tuning surface of the wave director.

use std::{
    fs,
    path::{Path, PathBuf},
};

use horde_director_core::{ArchetypeTags, ConfigurationError, SpawnPattern, SpawnZone, WavePhase};
use horde_director_system_performance::{PerformanceTuning, TuningError};
use serde::Deserialize;
use thiserror::Error;

/// Name given to the synthesized phase used by regular waves.
pub const DEFAULT_PHASE_NAME: &str = "Skirmish";

/// Errors raised while loading or validating a [`DirectorConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read director config at {path}")]
    Io {
        /// Location of the configuration file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The configuration was not valid TOML for the director schema.
    #[error("failed to parse director config")]
    Parse(#[from] toml::de::Error),
    /// The cooldown between waves is negative or not finite.
    #[error("time between waves must be a non-negative number of seconds, got {0}")]
    InvalidCooldown(f32),
    /// A special-wave chance lies outside `[0, 1]`.
    #[error("special wave chance `{name}` must lie within [0, 1], got {value}")]
    ChanceOutOfRange {
        /// Name of the offending field.
        name: &'static str,
        /// Configured value.
        value: f32,
    },
    /// The synthesized default phase would be unusable.
    #[error("default phase is invalid")]
    DefaultPhase(#[from] ConfigurationError),
    /// The performance tracker tuning would break difficulty adaptation.
    #[error("performance tuning is invalid")]
    Performance(#[from] TuningError),
}

/// Aggregated tuning knobs for the wave director.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Seconds of cooldown between a completed wave and the next one.
    pub time_between_waves: f32,
    /// Point budget of wave 1 before difficulty scaling.
    pub base_budget: u32,
    /// Budget added for every wave after the first.
    pub budget_increase_per_wave: u32,
    /// Height every spawn position is pinned to.
    pub ground_height: f32,
    /// Controls how often scripted special waves replace regular ones.
    pub special_waves: SpecialWaveTuning,
    /// Shape of the synthesized phase used by regular waves and as fallback.
    pub default_phase: DefaultPhaseTuning,
    /// Tuning forwarded to the performance tracker.
    pub performance: PerformanceTuning,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            time_between_waves: 5.0,
            base_budget: 100,
            budget_increase_per_wave: 20,
            ground_height: 0.0,
            special_waves: SpecialWaveTuning::default(),
            default_phase: DefaultPhaseTuning::default(),
            performance: PerformanceTuning::default(),
        }
    }
}

impl DirectorConfig {
    /// Loads and validates a configuration from the file at the provided path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates a configuration from TOML contents.
    ///
    /// Omitted fields keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the tuning values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.time_between_waves >= 0.0 && self.time_between_waves.is_finite()) {
            return Err(ConfigError::InvalidCooldown(self.time_between_waves));
        }

        for (name, value) in [
            ("early_chance", self.special_waves.early_chance),
            ("late_chance", self.special_waves.late_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ChanceOutOfRange { name, value });
            }
        }

        self.default_phase.to_phase().validate()?;
        self.performance.validate()?;
        Ok(())
    }

    /// Budget granted to `wave` before difficulty scaling.
    #[must_use]
    pub fn raw_budget(&self, wave: u32) -> f32 {
        let steps = wave.saturating_sub(1) as f32;
        self.base_budget as f32 + self.budget_increase_per_wave as f32 * steps
    }
}

/// Probability schedule for rolling a special wave.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpecialWaveTuning {
    /// First wave on which a special wave may be rolled.
    pub first_wave: u32,
    /// Wave from which `late_chance` replaces `early_chance`.
    pub late_wave: u32,
    /// Roll probability for waves in `[first_wave, late_wave)`.
    pub early_chance: f32,
    /// Roll probability for waves at or beyond `late_wave`.
    pub late_chance: f32,
}

impl Default for SpecialWaveTuning {
    fn default() -> Self {
        Self {
            first_wave: 5,
            late_wave: 10,
            early_chance: 0.2,
            late_chance: 0.4,
        }
    }
}

impl SpecialWaveTuning {
    /// Probability that `wave` rolls a special wave.
    #[must_use]
    pub fn chance(&self, wave: u32) -> f32 {
        if wave < self.first_wave {
            0.0
        } else if wave < self.late_wave {
            self.early_chance
        } else {
            self.late_chance
        }
    }
}

/// Parameters of the synthesized single-phase wave.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DefaultPhaseTuning {
    /// Phase length in seconds.
    pub duration: f32,
    /// Spawns per second.
    pub spawn_rate: f32,
    /// Cap on simultaneously alive enemies.
    pub max_enemies_alive: u32,
    /// Minimum spawn distance from the player.
    pub min_spawn_distance: f32,
    /// Maximum spawn distance from the player.
    pub max_spawn_distance: f32,
}

impl Default for DefaultPhaseTuning {
    fn default() -> Self {
        Self {
            duration: 15.0,
            spawn_rate: 1.0,
            max_enemies_alive: 10,
            min_spawn_distance: 15.0,
            max_spawn_distance: 25.0,
        }
    }
}

impl DefaultPhaseTuning {
    /// Builds the steady, randomly placed, full-pool phase.
    #[must_use]
    pub fn to_phase(&self) -> WavePhase {
        WavePhase {
            name: DEFAULT_PHASE_NAME.to_owned(),
            duration: self.duration,
            pattern: SpawnPattern::Steady,
            spawn_rate: self.spawn_rate,
            max_enemies_alive: self.max_enemies_alive,
            allowed_enemy_types: Vec::new(),
            preferences: ArchetypeTags::NONE,
            spawn_locations: vec![SpawnZone::Random],
            min_spawn_distance: self.min_spawn_distance,
            max_spawn_distance: self.max_spawn_distance,
            message: String::new(),
        }
    }
}
