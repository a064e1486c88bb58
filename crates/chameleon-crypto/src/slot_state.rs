//! Per-slot ratchet key material.
//!
//! # Security Properties
//!
//! - One-way: `next()` is a SHA-256 step, so slot T never reveals slot T−1
//! - Determinism: the same seed and slot always give the same state
//! - Zeroized on drop

use std::fmt;

use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::seed::Seed;

/// Slot state length in bytes
pub const SLOT_STATE_SIZE: usize = 32;

/// Label for deriving the next slot state
const SLOT_NEXT_LABEL: &[u8] = b"chameleon_slot_next_v1";

/// Key material for exactly one time slot.
#[derive(Clone, PartialEq, Eq)]
pub struct SlotState {
    bytes: [u8; SLOT_STATE_SIZE],
}

impl SlotState {
    /// Wrap raw state bytes.
    pub fn from_bytes(bytes: [u8; SLOT_STATE_SIZE]) -> Self {
        Self { bytes }
    }

    /// Compute the state for `slot` directly from the seed.
    ///
    /// `SHA-256(seed ‖ decimal(slot))`. Only used at initialization, for the
    /// current and previous slot.
    pub fn from_seed(seed: &Seed, slot: i64) -> Self {
        Self { bytes: sha256_concat(seed.as_bytes(), slot.to_string().as_bytes()) }
    }

    /// State for the following slot: `SHA-256(self ‖ label)`.
    #[must_use]
    pub fn next(&self) -> Self {
        Self { bytes: sha256_concat(&self.bytes, SLOT_NEXT_LABEL) }
    }

    /// Raw state bytes.
    pub fn as_bytes(&self) -> &[u8; SLOT_STATE_SIZE] {
        &self.bytes
    }

    /// `SHA-256(state ‖ decimal(msg_index))`.
    ///
    /// Shared input for the session key and the codebook shuffle.
    pub(crate) fn message_digest(&self, msg_index: u64) -> [u8; 32] {
        sha256_concat(&self.bytes, msg_index.to_string().as_bytes())
    }
}

impl fmt::Debug for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SlotState(..)")
    }
}

impl Drop for SlotState {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

fn sha256_concat(head: &[u8], tail: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(head);
    hasher.update(tail);
    hasher.finalize().into()
}
