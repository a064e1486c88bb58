//! Error types for the Chameleon core.
//!
//! Strongly-typed errors per layer: clock errors (rollback, lockout, lock
//! store), encrypt errors, decrypt errors and configuration errors.
//!
//! Rollback errors are fatal and never retried: they exist to stop a user
//! from winding the clock back to read expired messages.

use std::fmt;

use thiserror::Error;

use crate::lock_store::StorageError;

/// Errors from the time-slot source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// The clock produced a slot lower than one already observed
    #[error("clock rollback detected: slot {observed} observed after slot {highest}")]
    RollbackDetected {
        /// Slot computed from the current clock
        observed: i64,
        /// Highest slot seen before
        highest: i64,
    },

    /// A rollback marker is persisted for this device
    #[error("device locked after clock rollback (slot {observed} observed after slot {highest})")]
    RollbackLocked {
        /// Highest slot recorded in the marker
        highest: i64,
        /// Offending slot recorded in the marker
        observed: i64,
    },

    /// A rollback was detected but the marker could not be persisted.
    ///
    /// This process still refuses the slot and retries the write on the next
    /// read; a restart before that succeeds would lose the lockout.
    #[error("clock rollback detected (slot {observed} after slot {highest}) but lock not persisted: {source}")]
    RollbackUnpersisted {
        /// Slot computed from the current clock
        observed: i64,
        /// Highest slot seen before
        highest: i64,
        /// Why the marker write failed
        source: StorageError,
    },

    /// The clock jumped further ahead than the ratchet will step
    #[error("clock jumped from slot {held} to slot {observed}, more than {max} slots ahead")]
    ForwardJump {
        /// Slot the ratchet holds
        held: i64,
        /// Slot computed from the current clock
        observed: i64,
        /// Largest gap stepped one slot at a time
        max: i64,
    },

    /// The lock store could not be read or written
    #[error("lock store error: {0}")]
    Storage(#[from] StorageError),
}

impl SlotError {
    /// Returns true for rollback detection and lockout, persisted or not.
    ///
    /// Storage errors and forward jumps are not rollbacks: the ratchet keeps
    /// its keys and the caller may retry or re-initialize.
    pub fn is_rollback(&self) -> bool {
        matches!(
            self,
            Self::RollbackDetected { .. }
                | Self::RollbackLocked { .. }
                | Self::RollbackUnpersisted { .. }
        )
    }
}

/// Errors from [`crate::Chameleon::encrypt`] and friends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncryptError {
    /// `init` has not been called
    #[error("ratchet not initialized")]
    NotInitialized,

    /// Ratchet keys were wiped after a rollback
    #[error("ratchet wiped after clock rollback")]
    RollbackLocked,

    /// Reading the current slot failed
    #[error("time slot unavailable: {0}")]
    Clock(#[from] SlotError),

    /// Every searchable message index in this slot is used
    #[error("message indices exhausted for slot {slot} (max {max})")]
    MessageIndexExhausted {
        /// Current slot
        slot: i64,
        /// Highest index a decryptor searches
        max: u64,
    },
}

impl EncryptError {
    /// Returns true if this error comes from rollback detection or lockout.
    pub fn is_rollback(&self) -> bool {
        match self {
            Self::RollbackLocked => true,
            Self::Clock(err) => err.is_rollback(),
            _ => false,
        }
    }
}

/// Why a decrypt search found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustionReason {
    /// None of the candidate slots is still held by the ratchet (expired)
    NoUsableSlot,
    /// Slots were available but no (slot, index) pair authenticated: wrong
    /// mnemonic, expired message or foreign text
    NoCandidateAuthenticated,
}

impl fmt::Display for ExhaustionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoUsableSlot => f.write_str("no usable slot"),
            Self::NoCandidateAuthenticated => f.write_str("no candidate authenticated"),
        }
    }
}

/// Errors from [`crate::Chameleon::decrypt`] and friends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptError {
    /// `init` has not been called
    #[error("ratchet not initialized")]
    NotInitialized,

    /// Ratchet keys were wiped after a rollback
    #[error("ratchet wiped after clock rollback")]
    RollbackLocked,

    /// Reading the current slot failed
    #[error("time slot unavailable: {0}")]
    Clock(#[from] SlotError),

    /// Every candidate was tried and none decrypted
    #[error("decryption exhausted ({reason}), tried slots {tried_slots:?}")]
    Exhausted {
        /// Slots whose state was available, newest first
        tried_slots: Vec<i64>,
        /// Expiry vs. wrong credentials
        reason: ExhaustionReason,
    },

    /// Caller aborted the search between candidates
    #[error("decryption cancelled")]
    Cancelled,
}

impl DecryptError {
    /// Returns true if this error comes from rollback detection or lockout.
    pub fn is_rollback(&self) -> bool {
        match self {
            Self::RollbackLocked => true,
            Self::Clock(err) => err.is_rollback(),
            _ => false,
        }
    }
}

/// Invalid [`crate::ChameleonConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Slot duration must be positive
    #[error("slot duration must be positive, got {0} ms")]
    SlotDuration(i64),

    /// Slot window outside what the ratchet retains
    #[error("slot window must be between 1 and {max}, got {window}")]
    SlotWindow {
        /// Requested window
        window: usize,
        /// Largest supported window
        max: usize,
    },
}
