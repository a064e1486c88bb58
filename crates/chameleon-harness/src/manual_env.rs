//! Environment with a hand-driven clock and a seeded RNG.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicI64, Ordering},
};

use chameleon_core::{Environment, config::SLOT_DURATION_MS};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Deterministic environment for scenario tests.
///
/// Clones share the clock and the RNG, so a test can keep one handle to move
/// time while a session owns another. The clock may be set backwards to
/// simulate a rollback.
#[derive(Clone)]
pub struct ManualEnv {
    millis: Arc<AtomicI64>,
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl ManualEnv {
    /// Environment at the Unix epoch with an RNG seeded from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(0)),
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
        }
    }

    /// Environment positioned at the start of `slot`.
    pub fn at_slot(seed: u64, slot: i64) -> Self {
        let env = Self::new(seed);
        env.set_slot(slot);
        env
    }

    /// Current virtual time in Unix milliseconds.
    pub fn millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }

    /// Set the virtual clock, forwards or backwards.
    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
        tracing::trace!(millis, "Virtual clock set");
    }

    /// Move the virtual clock by `delta` milliseconds (negative rolls back).
    pub fn advance_millis(&self, delta: i64) {
        self.set_millis(self.millis().saturating_add(delta));
    }

    /// Jump to the start of `slot` (default slot width).
    pub fn set_slot(&self, slot: i64) {
        self.set_millis(slot.saturating_mul(SLOT_DURATION_MS));
    }

    /// Move the clock by whole slots (negative rolls back).
    pub fn advance_slots(&self, slots: i64) {
        self.advance_millis(slots.saturating_mul(SLOT_DURATION_MS));
    }

    /// Slot the virtual clock is in (default slot width).
    pub fn slot(&self) -> i64 {
        self.millis().div_euclid(SLOT_DURATION_MS)
    }
}

impl Environment for ManualEnv {
    fn unix_millis(&self) -> i64 {
        self.millis()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}
