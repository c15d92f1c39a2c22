//! Pure read-only queries over encounter templates.

use horde_director_core::{EnemyType, SpecialWave, StatKind};

/// Reports whether the template may appear in the provided wave.
///
/// The validity window is inclusive on both ends; an unset `max_wave` never
/// closes the window.
#[must_use]
pub fn is_eligible(template: &EnemyType, wave: u32) -> bool {
    wave >= template.min_wave && template.max_wave.map_or(true, |max| wave <= max)
}

/// Selection weight of the template in the provided wave, zero when ineligible.
#[must_use]
pub fn effective_weight(template: &EnemyType, wave: u32) -> f32 {
    if is_eligible(template, wave) {
        template.spawn_weight
    } else {
        0.0
    }
}

/// Linearly scaled stat of the template for the provided wave.
///
/// Scaling uses `wave - 1` steps, so wave 1 (and the pre-session wave 0)
/// yields the base stat.
#[must_use]
pub fn stat_for_wave(template: &EnemyType, wave: u32, kind: StatKind) -> f32 {
    let steps = wave.saturating_sub(1) as f32;
    template.stats.get(kind) + template.scaling.coefficient(kind) * steps
}

/// Reports whether a special wave may be rolled in the provided wave.
#[must_use]
pub fn special_wave_available(template: &SpecialWave, wave: u32) -> bool {
    template.min_wave_to_appear <= wave && template.selection_weight > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_director_core::{
        ArchetypeTags, BaseStats, Cosmetics, EnemyTypeId, SpecialWaveId, StatMultipliers,
        StatScaling,
    };

    fn template(min_wave: u32, max_wave: Option<u32>) -> EnemyType {
        EnemyType {
            id: EnemyTypeId::new(1),
            name: "Grunt".to_owned(),
            spawn_cost: 5,
            spawn_weight: 2.5,
            min_wave,
            max_wave,
            stats: BaseStats {
                health: 10.0,
                speed: 4.0,
                damage: 2.0,
                contact_cooldown: 1.0,
                contact_radius: 1.0,
            },
            scaling: StatScaling {
                health: 0.1,
                speed: 0.0,
                damage: 0.5,
            },
            tags: ArchetypeTags::NONE,
            cosmetics: Cosmetics::default(),
        }
    }

    #[test]
    fn eligibility_window_is_inclusive() {
        let bounded = template(3, Some(5));
        assert!(!is_eligible(&bounded, 2));
        assert!(is_eligible(&bounded, 3));
        assert!(is_eligible(&bounded, 5));
        assert!(!is_eligible(&bounded, 6));

        let open = template(3, None);
        assert!(is_eligible(&open, 10_000));
    }

    #[test]
    fn ineligible_templates_weigh_nothing() {
        let bounded = template(3, Some(5));
        assert_eq!(effective_weight(&bounded, 1), 0.0);
        assert_eq!(effective_weight(&bounded, 4), 2.5);
    }

    #[test]
    fn first_wave_uses_base_stats() {
        let grunt = template(1, None);
        assert_eq!(stat_for_wave(&grunt, 1, StatKind::Health), 10.0);
        assert_eq!(stat_for_wave(&grunt, 0, StatKind::Damage), 2.0);
    }

    #[test]
    fn scaling_matches_health_example() {
        let grunt = template(1, None);
        assert!((stat_for_wave(&grunt, 11, StatKind::Health) - 11.0).abs() < 1e-5);
        assert!((stat_for_wave(&grunt, 11, StatKind::Speed) - 4.0).abs() < 1e-5);
        assert!((stat_for_wave(&grunt, 11, StatKind::Damage) - 7.0).abs() < 1e-5);
    }

    #[test]
    fn scaled_stats_never_decrease_with_non_negative_coefficients() {
        let grunt = template(1, None);
        for kind in [StatKind::Health, StatKind::Speed, StatKind::Damage] {
            let mut previous = stat_for_wave(&grunt, 1, kind);
            for wave in 2..200 {
                let current = stat_for_wave(&grunt, wave, kind);
                assert!(current >= previous, "{kind:?} decreased at wave {wave}");
                previous = current;
            }
        }
    }

    #[test]
    fn special_waves_respect_their_threshold() {
        let special = SpecialWave {
            id: SpecialWaveId::new(1),
            name: "Siege".to_owned(),
            min_wave_to_appear: 8,
            selection_weight: 1.0,
            phases: Vec::new(),
            modifiers: StatMultipliers::NEUTRAL,
        };
        assert!(!special_wave_available(&special, 7));
        assert!(special_wave_available(&special, 8));
    }
}
