//! Boundary between the director and the game world it drives.

use std::{cell::Cell, rc::Rc};

use glam::Vec3;
use horde_director_core::{EntityHandle, SpawnRequest};

/// Capabilities the director needs from the hosting game.
///
/// The director never owns entities. It asks the host to instantiate them,
/// polls liveness to maintain its active set, and hands over a
/// [`DeathObserver`] for every spawn so kills can be credited.
pub trait DirectorHost {
    /// Current world position of the player.
    fn player_position(&self) -> Vec3;

    /// Current player health as a fraction of maximum, in `[0, 1]`.
    fn player_health_fraction(&self) -> f32;

    /// Instantiates an enemy and returns its handle.
    fn spawn_entity(&mut self, request: &SpawnRequest) -> EntityHandle;

    /// Reports whether the entity behind `handle` still exists.
    fn is_alive(&self, handle: EntityHandle) -> bool;

    /// Registers `observer` to be notified once when `handle` is killed.
    fn on_death(&mut self, handle: EntityHandle, observer: DeathObserver);
}

#[derive(Clone, Copy, Debug, Default)]
struct Ledger {
    wave: u32,
    kills: u32,
    open: bool,
}

/// Shared per-wave kill counter.
#[derive(Debug, Default)]
pub(crate) struct KillTally {
    ledger: Rc<Cell<Ledger>>,
}

impl KillTally {
    /// Resets the counter and opens it for `wave`.
    pub(crate) fn open(&self, wave: u32) {
        self.ledger.set(Ledger {
            wave,
            kills: 0,
            open: true,
        });
    }

    /// Stops crediting kills and returns the final count.
    pub(crate) fn close(&self) -> u32 {
        let mut ledger = self.ledger.get();
        ledger.open = false;
        self.ledger.set(ledger);
        ledger.kills
    }

    pub(crate) fn kills(&self) -> u32 {
        self.ledger.get().kills
    }

    pub(crate) fn observer(&self) -> DeathObserver {
        DeathObserver {
            wave: self.ledger.get().wave,
            ledger: Rc::clone(&self.ledger),
        }
    }
}

/// One-shot kill notification bound to the wave that spawned the entity.
///
/// Kills reported after that wave completed are ignored.
#[derive(Debug)]
#[must_use = "dropping the observer means the kill is never credited"]
pub struct DeathObserver {
    wave: u32,
    ledger: Rc<Cell<Ledger>>,
}

impl DeathObserver {
    /// Wave the observed entity was spawned in.
    #[must_use]
    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Credits the kill to the originating wave if it is still running.
    pub fn notify(self) {
        let mut ledger = self.ledger.get();
        if ledger.open && ledger.wave == self.wave {
            ledger.kills = ledger.kills.saturating_add(1);
            self.ledger.set(ledger);
        }
    }
}
