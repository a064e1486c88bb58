//! Session configuration.

use crate::error::ConfigError;

/// Width of one time slot in milliseconds
pub const SLOT_DURATION_MS: i64 = 60_000;

/// Slots searched on decrypt: the current one and the one before
pub const DEFAULT_SLOT_WINDOW: usize = 2;

/// Highest message index searched on decrypt (inclusive)
pub const DEFAULT_MAX_MSG_INDEX: u64 = 10;

/// The ratchet never holds more than this many slot states
pub const MAX_SLOT_WINDOW: usize = 2;

/// Largest clock jump the ratchet steps through one hash at a time, about
/// two years of one-minute slots. Larger jumps need a fresh `init`.
pub const MAX_ADVANCE_SLOTS: i64 = 1 << 20;

/// Chameleon session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChameleonConfig {
    /// Width of one time slot
    pub slot_duration_ms: i64,
    /// Number of slots the decryptor searches, newest first
    pub slot_window: usize,
    /// Message indices `0..=max_msg_index` are searched per slot
    pub max_msg_index: u64,
}

impl Default for ChameleonConfig {
    fn default() -> Self {
        Self {
            slot_duration_ms: SLOT_DURATION_MS,
            slot_window: DEFAULT_SLOT_WINDOW,
            max_msg_index: DEFAULT_MAX_MSG_INDEX,
        }
    }
}

impl ChameleonConfig {
    /// Check the configuration can be honoured by the ratchet.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_duration_ms <= 0 {
            return Err(ConfigError::SlotDuration(self.slot_duration_ms));
        }
        if self.slot_window == 0 || self.slot_window > MAX_SLOT_WINDOW {
            return Err(ConfigError::SlotWindow { window: self.slot_window, max: MAX_SLOT_WINDOW });
        }
        Ok(())
    }

    /// Wall-clock start of `slot` in Unix milliseconds.
    pub fn slot_start_millis(&self, slot: i64) -> i64 {
        slot.saturating_mul(self.slot_duration_ms)
    }

    /// First instant at which a message sealed in `slot` can no longer be
    /// decrypted: the start of slot `slot + slot_window`.
    pub fn decryptable_until_millis(&self, slot: i64) -> i64 {
        let window = i64::try_from(self.slot_window).unwrap_or(i64::MAX);
        self.slot_start_millis(slot.saturating_add(window))
    }

    /// Milliseconds left before a message sealed in `slot` expires, zero once
    /// it has.
    pub fn remaining_millis(&self, slot: i64, now_millis: i64) -> i64 {
        self.decryptable_until_millis(slot).saturating_sub(now_millis).max(0)
    }
}
