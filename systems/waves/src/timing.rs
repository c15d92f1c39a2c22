//! Per-pattern spawn cadence.

use horde_director_core::SpawnPattern;
use rand::Rng;

/// Multiple of the base interval a burst waits before it may fire.
const BURST_INTERVAL_FACTOR: f32 = 3.0;
/// Probability that an eligible burst check actually spawns.
const BURST_CHANCE: f64 = 0.3;
/// Angular frequency of the pulsing pattern, in radians per phase second.
const PULSE_FREQUENCY: f32 = 2.0;
/// Bounds of the jitter applied to the random pattern's interval.
const RANDOM_JITTER_MIN: f32 = 0.5;
const RANDOM_JITTER_MAX: f32 = 2.0;

/// Timing view of the active phase at the moment of a spawn check.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SpawnClock {
    /// Seconds since the phase started.
    pub(crate) phase_elapsed: f32,
    /// Total phase length.
    pub(crate) phase_duration: f32,
    /// Seconds since the last successful spawn of the wave.
    pub(crate) since_last_spawn: f32,
    /// Successful spawns in the active phase.
    pub(crate) spawns_in_phase: u32,
}

/// Decides whether `pattern` allows a spawn attempt under `clock`.
///
/// `interval` is the reciprocal of the effective spawn rate.
pub(crate) fn spawn_due<R>(pattern: SpawnPattern, interval: f32, clock: &SpawnClock, rng: &mut R) -> bool
where
    R: Rng + ?Sized,
{
    let since = clock.since_last_spawn;
    match pattern {
        SpawnPattern::Steady => since >= interval,
        SpawnPattern::Burst => {
            since >= interval * BURST_INTERVAL_FACTOR && rng.gen_bool(BURST_CHANCE)
        }
        SpawnPattern::AllAtOnce => clock.spawns_in_phase == 0 && since >= interval,
        SpawnPattern::Pulsing => {
            let pulse = 0.5 + 0.5 * (clock.phase_elapsed * PULSE_FREQUENCY).sin();
            since >= interval * (1.0 + pulse)
        }
        SpawnPattern::Escalating => {
            let progress = if clock.phase_duration > 0.0 {
                clock.phase_elapsed / clock.phase_duration
            } else {
                0.0
            };
            since >= interval / (1.0 + progress.max(0.0))
        }
        SpawnPattern::Random => {
            since >= interval * rng.gen_range(RANDOM_JITTER_MIN..RANDOM_JITTER_MAX)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn clock(phase_elapsed: f32, since_last_spawn: f32) -> SpawnClock {
        SpawnClock {
            phase_elapsed,
            phase_duration: 10.0,
            since_last_spawn,
            spawns_in_phase: 0,
        }
    }

    #[test]
    fn steady_waits_one_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(!spawn_due(SpawnPattern::Steady, 0.5, &clock(1.0, 0.49), &mut rng));
        assert!(spawn_due(SpawnPattern::Steady, 0.5, &clock(1.0, 0.5), &mut rng));
    }

    #[test]
    fn burst_needs_triple_interval_and_fires_roughly_thirty_percent() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            assert!(!spawn_due(SpawnPattern::Burst, 1.0, &clock(5.0, 2.9), &mut rng));
        }

        let trials = 10_000;
        let fired = (0..trials)
            .filter(|_| spawn_due(SpawnPattern::Burst, 1.0, &clock(5.0, 3.0), &mut rng))
            .count();
        let ratio = fired as f64 / trials as f64;
        assert!((ratio - 0.3).abs() < 0.03, "burst fired {ratio} of the time");
    }

    #[test]
    fn all_at_once_fires_only_before_the_first_spawn() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ready = clock(4.0, 10.0);
        assert!(spawn_due(SpawnPattern::AllAtOnce, 1.0, &ready, &mut rng));
        ready.spawns_in_phase = 1;
        assert!(!spawn_due(SpawnPattern::AllAtOnce, 1.0, &ready, &mut rng));
    }

    #[test]
    fn pulsing_interval_breathes_between_one_and_two() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        // sin(0) = 0, so the pulse factor is 1.5.
        assert!(!spawn_due(SpawnPattern::Pulsing, 1.0, &clock(0.0, 1.4), &mut rng));
        assert!(spawn_due(SpawnPattern::Pulsing, 1.0, &clock(0.0, 1.5), &mut rng));
        // sin(2 * 3π/4) = -1, so the pulse factor bottoms out at 1.0.
        let trough = 3.0 * std::f32::consts::FRAC_PI_4;
        assert!(spawn_due(SpawnPattern::Pulsing, 1.0, &clock(trough, 1.001), &mut rng));
    }

    #[test]
    fn escalating_interval_halves_by_phase_end() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        assert!(!spawn_due(SpawnPattern::Escalating, 1.0, &clock(0.0, 0.9), &mut rng));
        assert!(spawn_due(SpawnPattern::Escalating, 1.0, &clock(10.0, 0.51), &mut rng));
        assert!(!spawn_due(SpawnPattern::Escalating, 1.0, &clock(10.0, 0.49), &mut rng));
    }

    #[test]
    fn random_jitter_stays_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..1_000 {
            assert!(!spawn_due(SpawnPattern::Random, 1.0, &clock(1.0, 0.49), &mut rng));
            assert!(spawn_due(SpawnPattern::Random, 1.0, &clock(1.0, 2.0), &mut rng));
        }
    }
}
