#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Adaptive wave director.
//!
//! The director is a pure system advanced by [`WaveDirector::tick`]. Each
//! tick it prunes dead entities from its active set, walks the wave state
//! machine, and, while a phase is active, decides whether the phase's spawn
//! pattern allows another spawn. Spawns are paid for out of a per-wave point
//! budget that grows with the wave number and with the player's measured
//! performance. Completed waves feed a [`PerformanceTracker`] which in turn
//! scales the budget and the stats of future spawns.
//!
//! The director never touches the world directly. Everything it needs from
//! the game goes through [`DirectorHost`], and everything it wants to tell the
//! game is pushed into the caller's event buffer.

mod config;
mod host;
mod placement;
mod roster;
mod timing;

use std::{fmt, time::Duration};

use horde_director_catalog::{selection, Catalog};
use horde_director_core::{
    ConfigurationError, EntityHandle, Event, PerformanceSample, SpawnRequest, SpecialWave,
    SpecialWaveId, StatMultipliers, WavePhase, WaveReport,
};
use horde_director_system_performance::PerformanceTracker;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use self::config::{
    ConfigError, DefaultPhaseTuning, DirectorConfig, SpecialWaveTuning, DEFAULT_PHASE_NAME,
};
pub use self::host::{DeathObserver, DirectorHost};

use self::{
    host::KillTally,
    placement::Ring,
    timing::SpawnClock,
};

/// Upper bound on state transitions taken within a single tick.
const MAX_TRANSITIONS_PER_TICK: usize = 8;

/// Lifecycle states of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectorState {
    /// Waiting to open the next wave.
    AwaitingWaveStart,
    /// A wave has been opened and its first phase is about to start.
    WaveStarting,
    /// A phase is running and spawns are evaluated every tick.
    PhaseActive,
    /// The current phase ran out of time.
    ///
    /// After the final phase the director holds here until the board clears.
    PhaseComplete,
    /// The wave finished and its metrics are about to be recorded.
    WaveComplete,
    /// Waiting out the pause between waves.
    Cooldown,
}

impl fmt::Display for DirectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AwaitingWaveStart => "awaiting wave start",
            Self::WaveStarting => "wave starting",
            Self::PhaseActive => "phase active",
            Self::PhaseComplete => "phase complete",
            Self::WaveComplete => "wave complete",
            Self::Cooldown => "cooldown",
        };
        f.write_str(label)
    }
}

/// Point-in-time summary of the director, suitable for UI and telemetry.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveInfo {
    /// Current one-based wave number, zero before the first wave.
    pub wave: u32,
    /// Current state machine state.
    pub state: DirectorState,
    /// Name of the active special wave, if any.
    pub special_wave: Option<String>,
    /// Zero-based index of the active phase.
    pub phase_index: usize,
    /// Number of phases in the current wave.
    pub phase_count: usize,
    /// Name of the active phase.
    pub phase_name: String,
    /// Remaining point budget.
    pub budget: i32,
    /// Entities from this director still alive.
    pub alive: usize,
    /// Kills credited to the current wave.
    pub kills: u32,
    /// Damage the player took during the current wave.
    pub damage_taken: f32,
    /// Composite performance score.
    pub performance: f32,
    /// Mean difficulty multiplier.
    pub difficulty: f32,
}

impl fmt::Display for WaveInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wave {}", self.wave)?;
        if let Some(special) = &self.special_wave {
            write!(f, " [{special}]")?;
        }
        write!(
            f,
            " | {} | phase {}/{} \"{}\" | budget {} | alive {} | kills {} | damage {:.1} | performance {:.2} | difficulty {:.2}",
            self.state,
            self.phase_index + 1,
            self.phase_count,
            self.phase_name,
            self.budget,
            self.alive,
            self.kills,
            self.damage_taken,
            self.performance,
            self.difficulty,
        )
    }
}

#[derive(Clone, Debug)]
struct ActiveSpecial {
    id: SpecialWaveId,
    name: String,
    modifiers: StatMultipliers,
}

/// Mutable bookkeeping of the wave in progress.
#[derive(Debug)]
struct WaveRun {
    wave: u32,
    budget: i32,
    special: Option<ActiveSpecial>,
    plan: Vec<WavePhase>,
    phase_index: usize,
    phase: WavePhase,
    started_at: Duration,
    phase_started_at: Duration,
    last_spawn_at: Duration,
    completed_at: Duration,
    spawns_in_phase: u32,
    alive: Vec<EntityHandle>,
    damage_taken: f32,
}

impl WaveRun {
    fn idle(phase: WavePhase) -> Self {
        Self {
            wave: 0,
            budget: 0,
            special: None,
            plan: Vec::new(),
            phase_index: 0,
            phase,
            started_at: Duration::ZERO,
            phase_started_at: Duration::ZERO,
            last_spawn_at: Duration::ZERO,
            completed_at: Duration::ZERO,
            spawns_in_phase: 0,
            alive: Vec::new(),
            damage_taken: 0.0,
        }
    }

    fn phase_count(&self) -> usize {
        self.plan.len().max(1)
    }

    fn special_modifiers(&self) -> StatMultipliers {
        self.special
            .as_ref()
            .map_or(StatMultipliers::NEUTRAL, |special| special.modifiers)
    }
}

/// Drives waves of enemies against a host, adapting to player performance.
#[derive(Debug)]
pub struct WaveDirector<R = ChaCha8Rng> {
    config: DirectorConfig,
    catalog: Catalog,
    default_phase: WavePhase,
    tracker: PerformanceTracker,
    rng: R,
    state: DirectorState,
    run: WaveRun,
    kills: KillTally,
    clock: Duration,
    stopped: bool,
}

impl WaveDirector<ChaCha8Rng> {
    /// Creates a director whose random draws are reproducible from `seed`.
    pub fn with_seed(
        config: DirectorConfig,
        catalog: Catalog,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::new(config, catalog, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R> WaveDirector<R> {
    /// Creates a director in the [`DirectorState::AwaitingWaveStart`] state.
    ///
    /// The first wave opens on the first call to [`WaveDirector::tick`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` fails [`DirectorConfig::validate`].
    pub fn new(config: DirectorConfig, catalog: Catalog, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let tracker = PerformanceTracker::new(config.performance.clone());
        let default_phase = config.default_phase.to_phase();
        Ok(Self {
            run: WaveRun::idle(default_phase.clone()),
            default_phase,
            config,
            catalog,
            tracker,
            rng,
            state: DirectorState::AwaitingWaveStart,
            kills: KillTally::default(),
            clock: Duration::ZERO,
            stopped: false,
        })
    }

    /// Configuration the director was built with.
    #[must_use]
    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    /// Catalog the director draws templates from.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Performance tracker fed by completed waves.
    #[must_use]
    pub fn performance(&self) -> &PerformanceTracker {
        &self.tracker
    }

    /// Composite performance score in `[0, 1]`.
    #[must_use]
    pub fn overall_performance(&self) -> f32 {
        self.tracker.overall_performance()
    }

    /// Mean of the four difficulty multipliers.
    #[must_use]
    pub fn current_difficulty(&self) -> f32 {
        self.tracker.current_difficulty()
    }

    /// Current state machine state.
    #[must_use]
    pub fn state(&self) -> DirectorState {
        self.state
    }

    /// Current one-based wave number, zero before the first wave opens.
    #[must_use]
    pub fn current_wave(&self) -> u32 {
        self.run.wave
    }

    /// Remaining point budget of the current wave.
    #[must_use]
    pub fn budget(&self) -> i32 {
        self.run.budget
    }

    /// Handles of spawned entities the director still tracks as alive.
    #[must_use]
    pub fn active_entities(&self) -> &[EntityHandle] {
        &self.run.alive
    }

    /// Simulation time accumulated from [`WaveDirector::tick`].
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.clock
    }

    /// Adds player damage to the current wave's aggregate.
    ///
    /// Non-finite and non-positive amounts are ignored.
    pub fn record_player_damage(&mut self, amount: f32) {
        if amount.is_finite() && amount > 0.0 {
            self.run.damage_taken += amount;
        }
    }

    /// Halts the director. Subsequent ticks do nothing.
    ///
    /// Entities already spawned remain the host's responsibility.
    pub fn stop(&mut self) {
        if !self.stopped {
            log::info!("wave director stopped during wave {}", self.run.wave);
        }
        self.stopped = true;
    }

    /// Reports whether [`WaveDirector::stop`] has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Snapshot of the current wave for display.
    #[must_use]
    pub fn wave_info(&self) -> WaveInfo {
        WaveInfo {
            wave: self.run.wave,
            state: self.state,
            special_wave: self.run.special.as_ref().map(|special| special.name.clone()),
            phase_index: self.run.phase_index,
            phase_count: self.run.phase_count(),
            phase_name: self.run.phase.name.clone(),
            budget: self.run.budget,
            alive: self.run.alive.len(),
            kills: self.kills.kills(),
            damage_taken: self.run.damage_taken,
            performance: self.tracker.overall_performance(),
            difficulty: self.tracker.current_difficulty(),
        }
    }

    fn since(&self, mark: Duration) -> f32 {
        self.clock.saturating_sub(mark).as_secs_f32()
    }

    fn fallback_phase(&self, error: &ConfigurationError) -> WavePhase {
        log::warn!(
            "wave {}: {error}; using the default phase instead",
            self.run.wave
        );
        self.default_phase.clone()
    }
}

impl<R> WaveDirector<R>
where
    R: Rng,
{
    /// Advances the director by `dt` of simulation time.
    ///
    /// Dead entities are pruned first, then the state machine runs until it
    /// settles in a state that waits on time or on the board.
    pub fn tick<H>(&mut self, dt: Duration, host: &mut H, out: &mut Vec<Event>)
    where
        H: DirectorHost + ?Sized,
    {
        if self.stopped {
            return;
        }

        self.clock = self.clock.saturating_add(dt);
        self.run.alive.retain(|&handle| host.is_alive(handle));

        for _ in 0..MAX_TRANSITIONS_PER_TICK {
            if !self.step(host, out) {
                return;
            }
        }
        log::debug!("transition limit reached in state {}", self.state);
    }

    /// Runs one state's logic. Returns `true` when the state changed.
    fn step<H>(&mut self, host: &mut H, out: &mut Vec<Event>) -> bool
    where
        H: DirectorHost + ?Sized,
    {
        match self.state {
            DirectorState::AwaitingWaveStart => {
                self.begin_wave(out);
                self.state = DirectorState::WaveStarting;
                true
            }
            DirectorState::WaveStarting => {
                self.start_phase(0, self.clock, out);
                self.state = DirectorState::PhaseActive;
                true
            }
            DirectorState::PhaseActive => {
                if self.since(self.run.phase_started_at) < self.run.phase.duration {
                    self.evaluate_spawn(host, out);
                    false
                } else {
                    self.state = DirectorState::PhaseComplete;
                    true
                }
            }
            DirectorState::PhaseComplete => {
                let next = self.run.phase_index + 1;
                if next < self.run.phase_count() {
                    let started_at = self.scheduled_phase_end();
                    self.start_phase(next, started_at, out);
                    self.state = DirectorState::PhaseActive;
                    true
                } else if self.run.alive.is_empty() {
                    self.state = DirectorState::WaveComplete;
                    true
                } else {
                    false
                }
            }
            DirectorState::WaveComplete => {
                self.complete_wave(host, out);
                self.state = DirectorState::Cooldown;
                true
            }
            DirectorState::Cooldown => {
                if self.since(self.run.completed_at) >= self.config.time_between_waves {
                    self.state = DirectorState::AwaitingWaveStart;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn begin_wave(&mut self, out: &mut Vec<Event>) {
        let wave = self.run.wave.saturating_add(1);
        let scaled = self.config.raw_budget(wave) * self.tracker.multipliers().spawn_rate;
        let budget = scaled.round() as i32;

        let special = roll_special_wave(
            &self.catalog,
            &self.config.special_waves,
            wave,
            &mut self.rng,
        );
        let run = &mut self.run;
        match special {
            Some(template) => {
                run.plan = template.phases.clone();
                run.special = Some(ActiveSpecial {
                    id: template.id,
                    name: template.name.clone(),
                    modifiers: template.modifiers,
                });
            }
            None => {
                run.plan = vec![self.default_phase.clone()];
                run.special = None;
            }
        }

        run.wave = wave;
        run.budget = budget;
        run.phase_index = 0;
        run.started_at = self.clock;
        run.phase_started_at = self.clock;
        run.last_spawn_at = self.clock;
        run.spawns_in_phase = 0;
        run.damage_taken = 0.0;
        self.kills.open(wave);

        out.push(Event::WaveStarted { wave, budget });
        match &self.run.special {
            Some(special) => {
                log::info!(
                    "wave {wave} started as special wave `{}` with budget {budget}",
                    special.name
                );
                out.push(Event::SpecialWaveStarted {
                    wave,
                    id: special.id,
                    name: special.name.clone(),
                });
            }
            None => log::info!("wave {wave} started with budget {budget}"),
        }
    }

    /// Instant the current phase was due to end, never later than now.
    fn scheduled_phase_end(&self) -> Duration {
        Duration::try_from_secs_f32(self.run.phase.duration)
            .map(|duration| self.run.phase_started_at.saturating_add(duration))
            .map_or(self.clock, |end| end.min(self.clock))
    }

    fn start_phase(&mut self, index: usize, started_at: Duration, out: &mut Vec<Event>) {
        let phase = match self.run.plan.get(index) {
            Some(phase) => match phase.validate() {
                Ok(()) => phase.clone(),
                Err(error) => self.fallback_phase(&error),
            },
            None => {
                let wave = self
                    .run
                    .special
                    .as_ref()
                    .map_or_else(|| format!("wave {}", self.run.wave), |s| s.name.clone());
                self.fallback_phase(&ConfigurationError::NoPhases { wave })
            }
        };

        let wave = self.run.wave;
        log::debug!("wave {wave}: phase {index} `{}` started", phase.name);
        out.push(Event::PhaseStarted {
            wave,
            index,
            name: phase.name.clone(),
        });
        if !phase.message.is_empty() {
            out.push(Event::PhaseMessage {
                text: phase.message.clone(),
            });
        }

        self.run.phase_index = index;
        self.run.phase = phase;
        self.run.phase_started_at = started_at;
        self.run.spawns_in_phase = 0;
    }

    fn evaluate_spawn<H>(&mut self, host: &mut H, out: &mut Vec<Event>)
    where
        H: DirectorHost + ?Sized,
    {
        let phase = &self.run.phase;
        let cap = usize::try_from(phase.max_enemies_alive).unwrap_or(usize::MAX);
        if self.run.alive.len() >= cap {
            return;
        }

        let modifier = self.run.special_modifiers().spawn_rate;
        let modifier = if modifier > 0.0 && modifier.is_finite() {
            modifier
        } else {
            1.0
        };
        let interval = 1.0 / (phase.spawn_rate * modifier);
        let clock = SpawnClock {
            phase_elapsed: self.since(self.run.phase_started_at),
            phase_duration: phase.duration,
            since_last_spawn: self.since(self.run.last_spawn_at),
            spawns_in_phase: self.run.spawns_in_phase,
        };
        if !timing::spawn_due(phase.pattern, interval, &clock, &mut self.rng) {
            return;
        }

        self.attempt_spawn(host, out);
    }

    fn attempt_spawn<H>(&mut self, host: &mut H, out: &mut Vec<Event>)
    where
        H: DirectorHost + ?Sized,
    {
        let wave = self.run.wave;
        let enemy = match roster::choose_enemy(
            &self.catalog,
            &self.run.phase,
            wave,
            self.run.budget,
            &mut self.rng,
        ) {
            Ok(enemy) => enemy,
            Err(error) => {
                log::trace!("wave {wave}: spawn skipped, {error} (budget {})", self.run.budget);
                return;
            }
        };

        let ring = Ring {
            min_distance: self.run.phase.min_spawn_distance,
            max_distance: self.run.phase.max_spawn_distance,
            ground_height: self.config.ground_height,
        };
        let Some(position) = placement::spawn_position(
            &self.run.phase.spawn_locations,
            ring,
            host.player_position(),
            &mut self.rng,
        ) else {
            log::trace!("wave {wave}: spawn skipped, phase has no spawn locations");
            return;
        };

        let request = SpawnRequest {
            enemy: enemy.id,
            wave,
            position,
            stats: roster::scaled_stats(
                enemy,
                wave,
                self.run.special_modifiers(),
                self.tracker.multipliers(),
            ),
            cosmetics: enemy.cosmetics,
        };
        let cost = i32::try_from(enemy.spawn_cost).unwrap_or(i32::MAX);

        let handle = host.spawn_entity(&request);
        self.run.alive.push(handle);
        self.run.budget = self.run.budget.saturating_sub(cost);
        self.run.spawns_in_phase = self.run.spawns_in_phase.saturating_add(1);
        self.run.last_spawn_at = self.clock;
        host.on_death(handle, self.kills.observer());

        log::debug!(
            "wave {wave}: spawned {} as {handle:?}, budget left {}",
            enemy.name,
            self.run.budget
        );
        out.push(Event::EnemySpawned {
            handle,
            enemy: request.enemy,
        });
    }

    fn complete_wave<H>(&mut self, host: &mut H, out: &mut Vec<Event>)
    where
        H: DirectorHost + ?Sized,
    {
        let wave = self.run.wave;
        let clear_time = self.since(self.run.started_at);
        let kills = self.kills.close();
        let kills_per_minute = if clear_time > 0.0 {
            kills as f32 / clear_time * 60.0
        } else {
            0.0
        };
        let health = host.player_health_fraction();
        let final_health_pct = if health.is_finite() {
            health.clamp(0.0, 1.0) * 100.0
        } else {
            0.0
        };

        let sample = PerformanceSample {
            clear_time,
            final_health_pct,
            damage_taken: self.run.damage_taken,
            kills_per_minute,
        };
        self.tracker.record_wave_completion(sample);
        let report = WaveReport {
            sample,
            kills,
            performance: self.tracker.overall_performance(),
            difficulty: self.tracker.multipliers(),
        };
        self.run.completed_at = self.clock;

        log::info!(
            "wave {wave} cleared in {clear_time:.1}s with {kills} kills, difficulty now {:.2}",
            self.tracker.current_difficulty()
        );
        out.push(Event::WaveCompleted { wave, report });
    }
}

/// Rolls for a special wave and picks one among those available in `wave`.
fn roll_special_wave<'c, R>(
    catalog: &'c Catalog,
    tuning: &SpecialWaveTuning,
    wave: u32,
    rng: &mut R,
) -> Option<&'c SpecialWave>
where
    R: Rng + ?Sized,
{
    let chance = tuning.chance(wave);
    if chance.is_nan() || chance <= 0.0 || !rng.gen_bool(f64::from(chance.min(1.0))) {
        return None;
    }

    let candidates: Vec<(&SpecialWave, f32)> = catalog
        .available_special_waves(wave)
        .map(|special| (special, special.selection_weight))
        .collect();
    match selection::select_weighted(&candidates, rng) {
        Ok(special) => Some(*special),
        Err(_) => {
            log::debug!("wave {wave} rolled a special wave but none is available");
            None
        }
    }
}
