//! Enemy choice and stat resolution for a single spawn attempt.

use horde_director_catalog::{query, selection, Catalog};
use horde_director_core::{
    EnemyType, SelectionError, SpawnStats, StatKind, StatMultipliers, WavePhase,
};
use rand::Rng;

/// Weight multiplier granted per archetype a candidate shares with the phase.
pub(crate) const PREFERENCE_BOOST: f32 = 2.0;

/// Chooses the enemy for the next spawn of `phase`.
///
/// Candidates come from the phase roster, or the catalog default pool when
/// the roster is empty. Types unknown to the catalog, ineligible for `wave`
/// or costing more than `budget` are dropped before the weighted draw.
pub(crate) fn choose_enemy<'c, R>(
    catalog: &'c Catalog,
    phase: &WavePhase,
    wave: u32,
    budget: i32,
    rng: &mut R,
) -> Result<&'c EnemyType, SelectionError>
where
    R: Rng + ?Sized,
{
    let pool = if phase.allowed_enemy_types.is_empty() {
        catalog.default_pool()
    } else {
        phase.allowed_enemy_types.as_slice()
    };

    let mut candidates = Vec::with_capacity(pool.len());
    for &id in pool {
        let Some(enemy) = catalog.enemy(id) else {
            log::trace!("phase `{}` references unknown enemy {id:?}", phase.name);
            continue;
        };
        if i64::from(enemy.spawn_cost) > i64::from(budget) {
            continue;
        }
        let weight = query::effective_weight(enemy, wave);
        if weight <= 0.0 {
            continue;
        }
        let shared = phase.preferences.shared_with(&enemy.tags);
        let boost = PREFERENCE_BOOST.powi(i32::try_from(shared).unwrap_or(i32::MAX));
        candidates.push((enemy, (weight * boost).min(f32::MAX)));
    }

    selection::select_weighted(&candidates, rng).copied()
}

/// Final stats for `enemy` in `wave` under both multiplier sets.
pub(crate) fn scaled_stats(
    enemy: &EnemyType,
    wave: u32,
    special: StatMultipliers,
    difficulty: StatMultipliers,
) -> SpawnStats {
    let scaled = |kind: StatKind| {
        query::stat_for_wave(enemy, wave, kind) * special.for_stat(kind) * difficulty.for_stat(kind)
    };
    SpawnStats {
        health: scaled(StatKind::Health),
        speed: scaled(StatKind::Speed),
        damage: scaled(StatKind::Damage),
        contact_cooldown: enemy.stats.contact_cooldown,
        contact_radius: enemy.stats.contact_radius,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_director_core::{
        ArchetypeTags, BaseStats, Cosmetics, EnemyTypeId, SpawnPattern, SpawnZone, StatScaling,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn enemy(id: u32, cost: u32, tags: ArchetypeTags) -> EnemyType {
        EnemyType {
            id: EnemyTypeId::new(id),
            name: format!("enemy-{id}"),
            spawn_cost: cost,
            spawn_weight: 1.0,
            min_wave: 1,
            max_wave: None,
            stats: BaseStats {
                health: 10.0,
                speed: 2.0,
                damage: 1.0,
                contact_cooldown: 0.75,
                contact_radius: 1.25,
            },
            scaling: StatScaling {
                health: 0.5,
                speed: 0.0,
                damage: 0.25,
            },
            tags,
            cosmetics: Cosmetics::default(),
        }
    }

    fn phase(allowed: &[u32], preferences: ArchetypeTags) -> WavePhase {
        WavePhase {
            name: "Drill".to_owned(),
            duration: 10.0,
            pattern: SpawnPattern::Steady,
            spawn_rate: 1.0,
            max_enemies_alive: 5,
            allowed_enemy_types: allowed.iter().copied().map(EnemyTypeId::new).collect(),
            preferences,
            spawn_locations: vec![SpawnZone::Random],
            min_spawn_distance: 5.0,
            max_spawn_distance: 10.0,
            message: String::new(),
        }
    }

    fn catalog(enemies: Vec<EnemyType>, pool: Option<Vec<EnemyTypeId>>) -> Catalog {
        Catalog::new(enemies, Vec::new(), pool).expect("test catalog is valid")
    }

    const FAST: ArchetypeTags = ArchetypeTags {
        fast: true,
        armored: false,
        tank: false,
        boss: false,
    };

    #[test]
    fn unaffordable_enemies_are_never_chosen() {
        let catalog = catalog(
            vec![enemy(1, 5, ArchetypeTags::NONE), enemy(2, 50, ArchetypeTags::NONE)],
            None,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..200 {
            let chosen = choose_enemy(&catalog, &phase(&[], ArchetypeTags::NONE), 1, 10, &mut rng)
                .expect("grunt is affordable");
            assert_eq!(chosen.id, EnemyTypeId::new(1));
        }
        assert_eq!(
            choose_enemy(&catalog, &phase(&[], ArchetypeTags::NONE), 1, 4, &mut rng),
            Err(SelectionError::NoEligibleCandidate)
        );
    }

    #[test]
    fn phase_roster_overrides_default_pool() {
        let catalog = catalog(
            vec![enemy(1, 5, ArchetypeTags::NONE), enemy(2, 5, ArchetypeTags::NONE)],
            Some(vec![EnemyTypeId::new(1)]),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        for _ in 0..100 {
            let chosen = choose_enemy(&catalog, &phase(&[2], ArchetypeTags::NONE), 1, 100, &mut rng)
                .expect("roster is affordable");
            assert_eq!(chosen.id, EnemyTypeId::new(2));
        }
    }

    #[test]
    fn unknown_roster_entries_are_skipped() {
        let catalog = catalog(vec![enemy(1, 5, ArchetypeTags::NONE)], None);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        assert_eq!(
            choose_enemy(&catalog, &phase(&[77], ArchetypeTags::NONE), 1, 100, &mut rng),
            Err(SelectionError::NoEligibleCandidate)
        );
        let chosen = choose_enemy(&catalog, &phase(&[77, 1], ArchetypeTags::NONE), 1, 100, &mut rng)
            .expect("known entry remains");
        assert_eq!(chosen.id, EnemyTypeId::new(1));
    }

    #[test]
    fn preferred_archetypes_are_favoured() {
        let catalog = catalog(vec![enemy(1, 5, ArchetypeTags::NONE), enemy(2, 5, FAST)], None);
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let trials = 6_000;
        let fast = (0..trials)
            .filter(|_| {
                choose_enemy(&catalog, &phase(&[], FAST), 1, 100, &mut rng)
                    .map(|chosen| chosen.id == EnemyTypeId::new(2))
                    .unwrap_or(false)
            })
            .count();
        let ratio = fast as f64 / trials as f64;
        assert!((ratio - 2.0 / 3.0).abs() < 0.03, "fast share {ratio}");
    }

    #[test]
    fn boosted_huge_weights_remain_selectable() {
        let mut heavy = enemy(1, 5, FAST);
        heavy.spawn_weight = 3.0e38;
        let mut light = enemy(2, 5, ArchetypeTags::NONE);
        light.spawn_weight = 3.0e38;
        let catalog = catalog(vec![heavy, light], None);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for _ in 0..100 {
            assert!(choose_enemy(&catalog, &phase(&[], FAST), 1, 100, &mut rng).is_ok());
        }
    }

    #[test]
    fn stats_compose_wave_scaling_with_both_multiplier_sets() {
        let grunt = enemy(1, 5, ArchetypeTags::NONE);
        let special = StatMultipliers {
            health: 1.5,
            speed: 1.0,
            damage: 2.0,
            spawn_rate: 1.0,
        };
        let difficulty = StatMultipliers {
            health: 2.0,
            speed: 0.5,
            damage: 1.0,
            spawn_rate: 1.0,
        };

        let stats = scaled_stats(&grunt, 3, special, difficulty);
        // Health: (10 + 0.5 * 2) * 1.5 * 2.0.
        assert!((stats.health - 33.0).abs() < 1e-4);
        assert!((stats.speed - 1.0).abs() < 1e-4);
        // Damage: (1 + 0.25 * 2) * 2.0.
        assert!((stats.damage - 3.0).abs() < 1e-4);
        assert_eq!(stats.contact_cooldown, 0.75);
        assert_eq!(stats.contact_radius, 1.25);
    }
}
