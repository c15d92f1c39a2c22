//! Weighted random selection shared by special-wave and enemy choice.

use horde_director_core::SelectionError;
use rand::Rng;

/// Picks one candidate with probability proportional to its weight.
///
/// A single uniform sample `r ∈ [0, total)` is drawn and the first candidate
/// whose running weight reaches `r` wins. Candidates with non-positive or
/// non-finite weights never win. Weights are accumulated in `f64`, so a sum
/// of finite `f32` weights cannot overflow. If rounding leaves every running
/// weight below `r`, the last positively weighted candidate is returned, so
/// the call cannot fail on a non-empty, positively weighted input.
pub fn select_weighted<'a, T, R>(
    candidates: &'a [(T, f32)],
    rng: &mut R,
) -> Result<&'a T, SelectionError>
where
    R: Rng + ?Sized,
{
    let total: f64 = candidates
        .iter()
        .filter(|(_, weight)| usable(*weight))
        .map(|(_, weight)| f64::from(*weight))
        .sum();
    if !(total > 0.0 && total.is_finite()) {
        return Err(SelectionError::NoEligibleCandidate);
    }

    let draw = rng.gen_range(0.0..total);
    let mut cumulative = 0.0_f64;
    let mut fallback = None;
    for (candidate, weight) in candidates {
        if !usable(*weight) {
            continue;
        }
        cumulative += f64::from(*weight);
        if cumulative >= draw {
            return Ok(candidate);
        }
        fallback = Some(candidate);
    }

    fallback.ok_or(SelectionError::NoEligibleCandidate)
}

fn usable(weight: f32) -> bool {
    weight > 0.0 && weight.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn empty_input_has_no_candidate() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let candidates: [(u8, f32); 0] = [];
        assert_eq!(
            select_weighted(&candidates, &mut rng),
            Err(SelectionError::NoEligibleCandidate)
        );
    }

    #[test]
    fn zero_weights_are_never_selected() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let candidates = [("never", 0.0), ("always", 1.0), ("nan", f32::NAN)];
        for _ in 0..1_000 {
            assert_eq!(select_weighted(&candidates, &mut rng), Ok(&"always"));
        }

        let only_zero = [("never", 0.0)];
        assert_eq!(
            select_weighted(&only_zero, &mut rng),
            Err(SelectionError::NoEligibleCandidate)
        );
    }

    #[test]
    fn huge_finite_weights_still_select() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let candidates = [("a", 3.0e38), ("b", 3.0e38)];
        let mut hits = [0u32; 2];
        for _ in 0..1_000 {
            match select_weighted(&candidates, &mut rng) {
                Ok(&"a") => hits[0] += 1,
                Ok(&"b") => hits[1] += 1,
                other => panic!("unexpected selection {other:?}"),
            }
        }
        assert!(hits[0] > 350 && hits[1] > 350, "skewed split {hits:?}");
    }

    #[test]
    fn frequencies_converge_to_weight_share() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed_cafe);
        let candidates = [(0usize, 1.0), (1, 3.0), (2, 6.0)];
        let draws = 40_000;
        let mut hits = [0u32; 3];
        for _ in 0..draws {
            let picked = select_weighted(&candidates, &mut rng).expect("non-empty input");
            hits[*picked] += 1;
        }

        for (index, expected) in [0.1f32, 0.3, 0.6].into_iter().enumerate() {
            let observed = hits[index] as f32 / draws as f32;
            assert!(
                (observed - expected).abs() < 0.015,
                "candidate {index}: observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn seeded_selection_replays() {
        let candidates = [('a', 2.0), ('b', 1.0), ('c', 0.5)];
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..64)
                .map(|_| *select_weighted(&candidates, &mut rng).expect("non-empty input"))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(99), run(99));
    }
}
