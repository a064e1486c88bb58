//! Environment abstraction for deterministic testing.
//!
//! Decouples the ratchet and cipher from system resources (wall clock,
//! randomness). Enables deterministic simulation (virtual clock, seeded RNG)
//! and production use with real system resources.

use chameleon_crypto::NONCE_SIZE;

/// Abstract environment providing wall-clock time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion)
///
/// Unlike a monotonic clock, `unix_millis()` is allowed to go backwards.
/// Detecting that is the job of [`crate::SlotClock`].
pub trait Environment: Clone + Send + Sync + 'static {
    /// Milliseconds since the Unix epoch (negative before 1970).
    fn unix_millis(&self) -> i64;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Fresh AEAD nonce.
    fn random_nonce(&self) -> [u8; NONCE_SIZE] {
        let mut nonce = [0u8; NONCE_SIZE];
        self.random_bytes(&mut nonce);
        nonce
    }
}
