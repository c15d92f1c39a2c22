//! Scripted stand-in for a game world, driven by a player skill level.

use glam::Vec3;
use horde_director_core::{EntityHandle, SpawnRequest};
use horde_director_system_waves::{DeathObserver, DirectorHost};

/// Player hit points at full health.
const PLAYER_MAX_HEALTH: f32 = 100.0;
/// Hit points regenerated per second while the player is alive.
const PLAYER_REGEN_PER_SECOND: f32 = 1.5;
/// Damage per second dealt by a player with zero skill.
const BASE_DPS: f32 = 12.0;
/// Additional damage per second at full skill.
const SKILLED_DPS: f32 = 60.0;
/// Fraction of contact damage a fully skilled player avoids.
const MAX_DODGE: f32 = 0.6;

#[derive(Debug)]
struct Enemy {
    handle: EntityHandle,
    health: f32,
    distance: f32,
    speed: f32,
    damage: f32,
    contact_cooldown: f32,
    contact_radius: f32,
    contact_timer: f32,
    observer: Option<DeathObserver>,
}

/// Headless arena that fights back against the director.
///
/// The player focuses the oldest enemy and deals damage proportional to
/// skill. Enemies walk straight at the player and hit on contact.
#[derive(Debug)]
pub(crate) struct SimulatedArena {
    skill: f32,
    player_health: f32,
    next_handle: u64,
    enemies: Vec<Enemy>,
    spawned: u32,
    knockdowns: u32,
}

impl SimulatedArena {
    pub(crate) fn new(skill: f32) -> Self {
        Self {
            skill: skill.clamp(0.0, 1.0),
            player_health: PLAYER_MAX_HEALTH,
            next_handle: 0,
            enemies: Vec::new(),
            spawned: 0,
            knockdowns: 0,
        }
    }

    /// Total entities spawned since the arena was created.
    pub(crate) fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Times the player's health reached zero.
    pub(crate) fn knockdowns(&self) -> u32 {
        self.knockdowns
    }

    /// Simulates `dt` seconds of combat and returns the damage the player took.
    pub(crate) fn advance(&mut self, dt: f32) -> f32 {
        self.attack(dt);

        let dodge = 1.0 - MAX_DODGE * self.skill;
        let mut taken = 0.0;
        for enemy in &mut self.enemies {
            if enemy.distance > enemy.contact_radius {
                enemy.distance = (enemy.distance - enemy.speed * dt).max(0.0);
                continue;
            }
            enemy.contact_timer -= dt;
            if enemy.contact_timer <= 0.0 {
                taken += enemy.damage * dodge;
                enemy.contact_timer = enemy.contact_cooldown.max(0.1);
            }
        }

        self.player_health -= taken;
        if self.player_health <= 0.0 {
            self.knockdowns += 1;
            log::warn!("player overwhelmed by {} enemies", self.enemies.len());
            self.player_health = PLAYER_MAX_HEALTH;
        } else {
            self.player_health =
                (self.player_health + PLAYER_REGEN_PER_SECOND * dt).min(PLAYER_MAX_HEALTH);
        }
        taken
    }

    fn attack(&mut self, dt: f32) {
        let mut budget = (BASE_DPS + SKILLED_DPS * self.skill) * dt;
        while budget > 0.0 && !self.enemies.is_empty() {
            let target = &mut self.enemies[0];
            let dealt = budget.min(target.health);
            target.health -= dealt;
            budget -= dealt;
            if target.health > 0.0 {
                break;
            }
            let slain = self.enemies.remove(0);
            log::trace!("{:?} slain", slain.handle);
            if let Some(observer) = slain.observer {
                observer.notify();
            }
        }
    }
}

impl DirectorHost for SimulatedArena {
    fn player_position(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn player_health_fraction(&self) -> f32 {
        self.player_health / PLAYER_MAX_HEALTH
    }

    fn spawn_entity(&mut self, request: &SpawnRequest) -> EntityHandle {
        self.next_handle += 1;
        self.spawned += 1;
        let handle = EntityHandle::new(self.next_handle);
        self.enemies.push(Enemy {
            handle,
            health: request.stats.health.max(1.0),
            distance: request.position.length(),
            speed: request.stats.speed.max(0.0),
            damage: request.stats.damage.max(0.0),
            contact_cooldown: request.stats.contact_cooldown,
            contact_radius: request.stats.contact_radius,
            contact_timer: 0.0,
            observer: None,
        });
        handle
    }

    fn is_alive(&self, handle: EntityHandle) -> bool {
        self.enemies.iter().any(|enemy| enemy.handle == handle)
    }

    fn on_death(&mut self, handle: EntityHandle, observer: DeathObserver) {
        if let Some(enemy) = self.enemies.iter_mut().find(|enemy| enemy.handle == handle) {
            enemy.observer = Some(observer);
        }
    }
}
