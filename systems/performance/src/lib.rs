#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Closed-loop difficulty controller fed by rolling wave outcomes.
//!
//! Every completed wave contributes one [`PerformanceSample`]. The tracker
//! keeps the most recent samples in bounded windows, blends their averages
//! into a composite score in `[0, 1]`, and nudges four difficulty multipliers
//! proportionally to how far that score sits from the neutral midpoint.

mod window;

use horde_director_core::{
    PerformanceSample, StatMultipliers, MAX_DIFFICULTY_MULTIPLIER, MIN_DIFFICULTY_MULTIPLIER,
};
use serde::Deserialize;
use thiserror::Error;

use self::window::RollingWindow;

/// Score reported before any wave has completed.
pub const NEUTRAL_SCORE: f32 = 0.5;

/// Reasons a [`PerformanceTuning`] cannot drive the tracker.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TuningError {
    /// The rolling history must retain at least one wave.
    #[error("history size must be at least 1")]
    EmptyHistory,
    /// Multiplier bounds are not finite, not positive, or inverted.
    #[error("multiplier bounds must satisfy 0 < min <= max, got [{min}, {max}]")]
    InvalidBounds {
        /// Configured lower bound.
        min: f32,
        /// Configured upper bound.
        max: f32,
    },
    /// A numeric knob is NaN, infinite, or negative.
    #[error("tuning value `{name}` must be finite and non-negative, got {value}")]
    InvalidValue {
        /// Name of the offending field.
        name: &'static str,
        /// Configured value.
        value: f32,
    },
}

/// Tuning knobs controlling how quickly and how far difficulty adapts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PerformanceTuning {
    /// Number of completed waves kept in the rolling history.
    pub history_size: usize,
    /// Gain applied to the score error; larger values react faster.
    pub adjustment_speed: f32,
    /// Lower clamp for every multiplier.
    pub min_multiplier: f32,
    /// Upper clamp for every multiplier.
    pub max_multiplier: f32,
    /// Average clear time (seconds) that scores a perfect time component.
    pub fast_clear_time: f32,
    /// Average clear time (seconds) that scores zero on the time component.
    pub slow_clear_time: f32,
    /// Average damage taken that scores zero on the damage component.
    pub damage_ceiling: f32,
    /// Average kills per minute that scores a perfect kill component.
    pub kill_rate_ceiling: f32,
    /// Blend applied to the four normalised components.
    pub weights: ScoreWeights,
}

impl Default for PerformanceTuning {
    fn default() -> Self {
        Self {
            history_size: 10,
            adjustment_speed: 0.2,
            min_multiplier: MIN_DIFFICULTY_MULTIPLIER,
            max_multiplier: MAX_DIFFICULTY_MULTIPLIER,
            fast_clear_time: 20.0,
            slow_clear_time: 60.0,
            damage_ceiling: 50.0,
            kill_rate_ceiling: 20.0,
            weights: ScoreWeights::default(),
        }
    }
}

impl PerformanceTuning {
    /// Checks that every knob keeps the tracker's arithmetic well defined.
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.history_size == 0 {
            return Err(TuningError::EmptyHistory);
        }

        let (min, max) = (self.min_multiplier, self.max_multiplier);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(TuningError::InvalidBounds { min, max });
        }

        let weights = &self.weights;
        for (name, value) in [
            ("adjustment_speed", self.adjustment_speed),
            ("fast_clear_time", self.fast_clear_time),
            ("slow_clear_time", self.slow_clear_time),
            ("damage_ceiling", self.damage_ceiling),
            ("kill_rate_ceiling", self.kill_rate_ceiling),
            ("weights.time", weights.time),
            ("weights.health", weights.health),
            ("weights.damage", weights.damage),
            ("weights.kills", weights.kills),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(TuningError::InvalidValue { name, value });
            }
        }
        Ok(())
    }
}

/// Relative contribution of each component to the composite score.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Weight of the clear-time component.
    pub time: f32,
    /// Weight of the retained-health component.
    pub health: f32,
    /// Weight of the damage-avoided component.
    pub damage: f32,
    /// Weight of the kill-rate component.
    pub kills: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            time: 0.3,
            health: 0.3,
            damage: 0.2,
            kills: 0.2,
        }
    }
}

/// Rolling averages over the retained history.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerformanceAverages {
    /// Mean clear time in seconds.
    pub clear_time: f32,
    /// Mean final player health in percent.
    pub final_health_pct: f32,
    /// Mean damage taken per wave.
    pub damage_taken: f32,
    /// Mean kills per minute.
    pub kills_per_minute: f32,
}

/// Maintains wave history and the four session-scoped difficulty multipliers.
#[derive(Debug)]
pub struct PerformanceTracker {
    tuning: PerformanceTuning,
    clear_times: RollingWindow,
    final_health: RollingWindow,
    damage_taken: RollingWindow,
    kill_rates: RollingWindow,
    score: f32,
    multipliers: StatMultipliers,
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new(PerformanceTuning::default())
    }
}

impl PerformanceTracker {
    /// Creates a tracker with empty history and neutral multipliers.
    #[must_use]
    pub fn new(tuning: PerformanceTuning) -> Self {
        let capacity = tuning.history_size.max(1);
        Self {
            tuning,
            clear_times: RollingWindow::new(capacity),
            final_health: RollingWindow::new(capacity),
            damage_taken: RollingWindow::new(capacity),
            kill_rates: RollingWindow::new(capacity),
            score: NEUTRAL_SCORE,
            multipliers: StatMultipliers::NEUTRAL,
        }
    }

    /// Tuning the tracker was built with.
    #[must_use]
    pub fn tuning(&self) -> &PerformanceTuning {
        &self.tuning
    }

    /// Records one completed wave and adapts the multipliers.
    pub fn record_wave_completion(&mut self, sample: PerformanceSample) {
        self.clear_times.push(sample.clear_time);
        self.final_health.push(sample.final_health_pct);
        self.damage_taken.push(sample.damage_taken);
        self.kill_rates.push(sample.kills_per_minute);

        self.score = self
            .averages()
            .map_or(NEUTRAL_SCORE, |averages| self.composite_score(&averages));

        let delta = (self.score - NEUTRAL_SCORE) * self.tuning.adjustment_speed;
        let delta = if delta.is_finite() { delta } else { 0.0 };
        self.multipliers = self.multipliers.nudged(
            delta,
            self.tuning.min_multiplier,
            self.tuning.max_multiplier,
        );

        log::debug!(
            "performance score {:.3} after {} samples, difficulty now {:.3}",
            self.score,
            self.sample_count(),
            self.current_difficulty()
        );
    }

    /// Composite performance score in `[0, 1]`; neutral until a wave completes.
    #[must_use]
    pub fn overall_performance(&self) -> f32 {
        self.score
    }

    /// Mean of the four difficulty multipliers.
    #[must_use]
    pub fn current_difficulty(&self) -> f32 {
        self.multipliers.mean()
    }

    /// Current difficulty multipliers.
    #[must_use]
    pub fn multipliers(&self) -> StatMultipliers {
        self.multipliers
    }

    /// Number of samples currently retained.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.clear_times.len()
    }

    /// Rolling averages over the retained samples, if any.
    #[must_use]
    pub fn averages(&self) -> Option<PerformanceAverages> {
        Some(PerformanceAverages {
            clear_time: self.clear_times.mean()?,
            final_health_pct: self.final_health.mean()?,
            damage_taken: self.damage_taken.mean()?,
            kills_per_minute: self.kill_rates.mean()?,
        })
    }

    /// Clears the history and restores neutral multipliers.
    pub fn reset(&mut self) {
        self.clear_times.clear();
        self.final_health.clear();
        self.damage_taken.clear();
        self.kill_rates.clear();
        self.score = NEUTRAL_SCORE;
        self.multipliers = StatMultipliers::NEUTRAL;
    }

    fn composite_score(&self, averages: &PerformanceAverages) -> f32 {
        let tuning = &self.tuning;
        let clear_span = (tuning.slow_clear_time - tuning.fast_clear_time).max(f32::EPSILON);

        let time = unit(1.0 - (averages.clear_time - tuning.fast_clear_time) / clear_span);
        let health = unit(averages.final_health_pct / 100.0);
        let damage = unit(1.0 - averages.damage_taken / tuning.damage_ceiling.max(f32::EPSILON));
        let kills = unit(averages.kills_per_minute / tuning.kill_rate_ceiling.max(f32::EPSILON));

        let weights = &tuning.weights;
        let score = weights.time * time
            + weights.health * health
            + weights.damage * damage
            + weights.kills * kills;
        unit(score)
    }
}

/// Clamps into `[0, 1]`, mapping NaN to zero.
fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
