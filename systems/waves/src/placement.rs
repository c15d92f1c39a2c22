//! Spawn placement around the player.

use std::f32::consts::TAU;

use glam::Vec3;
use horde_director_core::SpawnZone;
use rand::{seq::SliceRandom, Rng};
use rand_distr::{Distribution, UnitCircle};

/// Ground-plane placement constraints of a phase.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Ring {
    pub(crate) min_distance: f32,
    pub(crate) max_distance: f32,
    pub(crate) ground_height: f32,
}

/// Picks a zone uniformly and returns a point at a uniform distance within the
/// ring, with height pinned to the ground. `None` when `zones` is empty.
pub(crate) fn spawn_position<R>(
    zones: &[SpawnZone],
    ring: Ring,
    player: Vec3,
    rng: &mut R,
) -> Option<Vec3>
where
    R: Rng + ?Sized,
{
    let zone = *zones.choose(rng)?;
    let direction = zone_direction(zone, rng);
    let distance = if ring.max_distance > ring.min_distance {
        rng.gen_range(ring.min_distance..=ring.max_distance)
    } else {
        ring.min_distance
    };

    let mut position = player + direction * distance;
    position.y = ring.ground_height;
    Some(position)
}

/// Unit direction on the ground plane for the provided zone.
pub(crate) fn zone_direction<R>(zone: SpawnZone, rng: &mut R) -> Vec3
where
    R: Rng + ?Sized,
{
    match zone {
        SpawnZone::Random => {
            let [x, z]: [f32; 2] = UnitCircle.sample(rng);
            Vec3::new(x, 0.0, z)
        }
        SpawnZone::Front => Vec3::Z,
        SpawnZone::Behind => Vec3::NEG_Z,
        SpawnZone::Sides => {
            if rng.gen_bool(0.5) {
                Vec3::X
            } else {
                Vec3::NEG_X
            }
        }
        SpawnZone::Surrounding => {
            let angle = rng.gen_range(0.0..TAU);
            Vec3::new(angle.cos(), 0.0, angle.sin())
        }
    }
}
