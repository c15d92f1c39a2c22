#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Encounter template catalog for the horde director.
//!
//! The catalog owns the immutable [`EnemyType`] and [`SpecialWave`] templates
//! and the default enemy pool used by phases that do not restrict their
//! roster. Templates are validated once on construction; afterwards the
//! catalog is read-only and every query in [`query`] is pure.

pub mod query;
pub mod selection;

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use horde_director_core::{
    ConfigurationError, EnemyType, EnemyTypeId, SpecialWave, SpecialWaveId,
};
use serde::Deserialize;
use thiserror::Error;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;
const STANDARD_MANIFEST: &str = include_str!("../data/standard.toml");

/// Errors raised while building or loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The manifest file could not be read.
    #[error("failed to read catalog manifest at {path}")]
    Io {
        /// Location of the manifest.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The manifest was not valid TOML for the catalog schema.
    #[error("failed to parse catalog manifest")]
    Parse(#[from] toml::de::Error),
    /// The manifest declared a version this build does not understand.
    #[error("unsupported catalog manifest version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version found in the manifest.
        found: u32,
        /// Version supported by this build.
        expected: u32,
    },
    /// Two enemy templates share an identifier.
    #[error("enemy type {0:?} is declared more than once")]
    DuplicateEnemy(EnemyTypeId),
    /// Two special waves share an identifier.
    #[error("special wave {0:?} is declared more than once")]
    DuplicateSpecialWave(SpecialWaveId),
    /// An enemy template has a zero spawn cost.
    #[error("enemy type {0:?} must have a positive spawn cost")]
    NonPositiveCost(EnemyTypeId),
    /// An enemy template has a non-positive or non-finite spawn weight.
    #[error("enemy type {0:?} must have a positive spawn weight")]
    NonPositiveWeight(EnemyTypeId),
    /// An enemy template closes its wave window before opening it.
    #[error("enemy type {id:?} has inverted wave window {min}..={max}")]
    InvertedWaveWindow {
        /// Offending template.
        id: EnemyTypeId,
        /// Configured first wave.
        min: u32,
        /// Configured last wave.
        max: u32,
    },
    /// A special wave has a non-positive or non-finite selection weight.
    #[error("special wave {0:?} must have a positive selection weight")]
    NonPositiveSelectionWeight(SpecialWaveId),
    /// The default pool references an unknown enemy type.
    #[error("default pool references unknown enemy type {0:?}")]
    UnknownPoolEntry(EnemyTypeId),
}

/// Validated, read-only collection of encounter templates.
#[derive(Clone, Debug)]
pub struct Catalog {
    enemies: Vec<EnemyType>,
    special_waves: Vec<SpecialWave>,
    default_pool: Vec<EnemyTypeId>,
}

impl Catalog {
    /// Validates the templates and builds a catalog.
    ///
    /// When `default_pool` is `None` every enemy type joins the default pool.
    pub fn new(
        mut enemies: Vec<EnemyType>,
        mut special_waves: Vec<SpecialWave>,
        default_pool: Option<Vec<EnemyTypeId>>,
    ) -> Result<Self, CatalogError> {
        enemies.sort_by_key(|enemy| enemy.id);
        special_waves.sort_by_key(|special| special.id);

        for pair in enemies.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(CatalogError::DuplicateEnemy(pair[0].id));
            }
        }
        for pair in special_waves.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(CatalogError::DuplicateSpecialWave(pair[0].id));
            }
        }

        for enemy in &enemies {
            validate_enemy(enemy)?;
        }
        for special in &special_waves {
            let weight = special.selection_weight;
            if !(weight > 0.0 && weight.is_finite()) {
                return Err(CatalogError::NonPositiveSelectionWeight(special.id));
            }
        }

        let default_pool = match default_pool {
            Some(pool) => {
                if let Some(unknown) = pool
                    .iter()
                    .find(|id| enemies.binary_search_by_key(*id, |enemy| enemy.id).is_err())
                {
                    return Err(CatalogError::UnknownPoolEntry(*unknown));
                }
                pool
            }
            None => enemies.iter().map(|enemy| enemy.id).collect(),
        };

        Ok(Self {
            enemies,
            special_waves,
            default_pool,
        })
    }

    /// Loads the roster bundled with the crate.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::from_toml_str(STANDARD_MANIFEST)
    }

    /// Loads a catalog from the manifest located at the provided path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses a catalog from TOML manifest contents.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let manifest: Manifest = toml::from_str(contents)?;
        if manifest.version != SUPPORTED_MANIFEST_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                found: manifest.version,
                expected: SUPPORTED_MANIFEST_VERSION,
            });
        }

        let catalog = Self::new(
            manifest.enemies,
            manifest.special_waves,
            manifest.default_pool,
        )?;
        log::debug!(
            "loaded catalog with {} enemy types and {} special waves",
            catalog.enemies.len(),
            catalog.special_waves.len()
        );
        Ok(catalog)
    }

    /// Looks up an enemy template by identifier.
    #[must_use]
    pub fn enemy(&self, id: EnemyTypeId) -> Option<&EnemyType> {
        self.enemies
            .binary_search_by_key(&id, |enemy| enemy.id)
            .ok()
            .map(|index| &self.enemies[index])
    }

    /// All enemy templates ordered by identifier.
    #[must_use]
    pub fn enemies(&self) -> &[EnemyType] {
        &self.enemies
    }

    /// Looks up a special wave by identifier.
    #[must_use]
    pub fn special_wave(&self, id: SpecialWaveId) -> Option<&SpecialWave> {
        self.special_waves
            .binary_search_by_key(&id, |special| special.id)
            .ok()
            .map(|index| &self.special_waves[index])
    }

    /// All special waves ordered by identifier.
    #[must_use]
    pub fn special_waves(&self) -> &[SpecialWave] {
        &self.special_waves
    }

    /// Enemy pool used by phases that do not restrict their roster.
    #[must_use]
    pub fn default_pool(&self) -> &[EnemyTypeId] {
        &self.default_pool
    }

    /// Special waves that may be rolled in the provided wave.
    pub fn available_special_waves(&self, wave: u32) -> impl Iterator<Item = &SpecialWave> {
        self.special_waves
            .iter()
            .filter(move |special| query::special_wave_available(special, wave))
    }

    /// Lists recoverable phase-level issues the director would fall back from.
    #[must_use]
    pub fn configuration_warnings(&self) -> Vec<ConfigurationError> {
        let mut warnings = Vec::new();
        let mut reported = HashSet::new();

        for special in &self.special_waves {
            if special.phases.is_empty() {
                warnings.push(ConfigurationError::NoPhases {
                    wave: special.name.clone(),
                });
            }

            for phase in &special.phases {
                if let Err(error) = phase.validate() {
                    warnings.push(error);
                }
                for id in &phase.allowed_enemy_types {
                    if self.enemy(*id).is_none() && reported.insert(*id) {
                        warnings.push(ConfigurationError::UnknownEnemyType { id: *id });
                    }
                }
            }
        }

        warnings
    }
}

fn validate_enemy(enemy: &EnemyType) -> Result<(), CatalogError> {
    if enemy.spawn_cost == 0 {
        return Err(CatalogError::NonPositiveCost(enemy.id));
    }
    if !(enemy.spawn_weight > 0.0 && enemy.spawn_weight.is_finite()) {
        return Err(CatalogError::NonPositiveWeight(enemy.id));
    }
    if let Some(max) = enemy.max_wave {
        if max < enemy.min_wave {
            return Err(CatalogError::InvertedWaveWindow {
                id: enemy.id,
                min: enemy.min_wave,
                max,
            });
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    version: u32,
    #[serde(default, rename = "enemy")]
    enemies: Vec<EnemyType>,
    #[serde(default, rename = "special_wave")]
    special_waves: Vec<SpecialWave>,
    #[serde(default)]
    default_pool: Option<Vec<EnemyTypeId>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_roster_loads() {
        let catalog = Catalog::standard().expect("bundled manifest is valid");
        assert!(!catalog.enemies().is_empty());
        assert!(!catalog.special_waves().is_empty());
        assert!(catalog.configuration_warnings().is_empty());
    }

    #[test]
    fn rejects_unknown_manifest_version() {
        let error = Catalog::from_toml_str("version = 2").expect_err("version 2 is unsupported");
        assert!(matches!(
            error,
            CatalogError::UnsupportedVersion {
                found: 2,
                expected: 1
            }
        ));
    }

    #[test]
    fn empty_manifest_has_empty_pool() {
        let catalog = Catalog::from_toml_str("version = 1").expect("empty manifest is valid");
        assert!(catalog.default_pool().is_empty());
        assert_eq!(catalog.available_special_waves(50).count(), 0);
    }
}
