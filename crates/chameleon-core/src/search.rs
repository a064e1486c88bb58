//! Bounded decrypt search over (slot, message index) candidates.
//!
//! The decryptor does not know which slot or index a message was sealed
//! under. It tries every candidate the ratchet can still reach, newest slot
//! first and ascending index, and stops at the first one that authenticates.
//!
//! ```text
//! for slot in [T, T-1]            (only slots the snapshot still holds)
//!   for idx in 0..=max_msg_index
//!     codebook(slot, idx) -> decode -> key(slot, idx) -> open
//! ```
//!
//! Per-candidate failures (unknown symbol, short envelope, failed tag) are
//! expected and suppressed. Nothing is mutated until a candidate succeeds.

use chameleon_crypto::{Codebook, decode_envelope, derive_session_key, open};

use crate::{
    config::ChameleonConfig,
    error::{DecryptError, ExhaustionReason},
    ratchet::RatchetSnapshot,
};

/// A successfully decrypted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    /// Raw plaintext bytes
    pub plaintext: Vec<u8>,
    /// Slot whose state authenticated the message
    pub slot: i64,
    /// Message index that authenticated the message
    pub msg_index: u64,
}

/// Candidate bounds for a decrypt search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptSearch {
    slot_window: usize,
    max_msg_index: u64,
}

impl DecryptSearch {
    /// Search bounds taken from a session configuration.
    pub fn new(config: &ChameleonConfig) -> Self {
        Self { slot_window: config.slot_window, max_msg_index: config.max_msg_index }
    }

    /// Candidate slots, newest first.
    fn candidate_slots(&self, current: i64) -> impl Iterator<Item = i64> {
        (0..self.slot_window as i64).map_while(move |back| current.checked_sub(back))
    }

    /// Try every candidate against `text`.
    ///
    /// `is_cancelled` is polled before each candidate.
    ///
    /// # Errors
    ///
    /// - `Cancelled` if `is_cancelled` returned true
    /// - `Exhausted` if no candidate authenticated
    pub fn run(
        &self,
        snapshot: &RatchetSnapshot,
        text: &str,
        is_cancelled: impl Fn() -> bool,
    ) -> Result<DecryptedMessage, DecryptError> {
        let mut tried_slots = Vec::with_capacity(self.slot_window);

        for slot in self.candidate_slots(snapshot.slot()) {
            let Some(slot_state) = snapshot.slot_state(slot) else {
                continue;
            };
            tried_slots.push(slot);

            for msg_index in 0..=self.max_msg_index {
                if is_cancelled() {
                    return Err(DecryptError::Cancelled);
                }

                let codebook = Codebook::derive(slot_state, msg_index);
                let Ok(envelope) = decode_envelope(text, &codebook) else {
                    continue;
                };

                let key = derive_session_key(slot_state, msg_index);
                if let Ok(plaintext) = open(&key, &envelope) {
                    tracing::debug!(slot, msg_index, "Decrypt candidate authenticated");
                    return Ok(DecryptedMessage { plaintext, slot, msg_index });
                }
            }
        }

        let reason = if tried_slots.is_empty() {
            ExhaustionReason::NoUsableSlot
        } else {
            ExhaustionReason::NoCandidateAuthenticated
        };

        Err(DecryptError::Exhausted { tried_slots, reason })
    }
}

impl Default for DecryptSearch {
    fn default() -> Self {
        Self::new(&ChameleonConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chameleon_crypto::{SlotState, encode, seal};

    use super::*;
    use crate::{error::SlotError, ratchet::Ratchet, slot_clock::SlotSource};

    struct At(i64);

    impl SlotSource for At {
        fn current_slot(&self) -> Result<i64, SlotError> {
            Ok(self.0)
        }
    }

    fn snapshot_at(slot: i64) -> RatchetSnapshot {
        let mut ratchet = Ratchet::new();
        ratchet.init("zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong", "", &At(slot)).unwrap();
        ratchet.snapshot().unwrap()
    }

    fn seal_text(state: &SlotState, msg_index: u64, plaintext: &[u8]) -> String {
        let key = derive_session_key(state, msg_index);
        let envelope = seal(&key, plaintext, [9u8; 12]);
        encode(&envelope.to_bytes(), &Codebook::derive(state, msg_index))
    }

    #[test]
    fn finds_message_in_current_slot() {
        let snapshot = snapshot_at(50);
        let text = seal_text(snapshot.current(), 3, b"current");

        let found = DecryptSearch::default().run(&snapshot, &text, || false).unwrap();
        assert_eq!(found, DecryptedMessage { plaintext: b"current".to_vec(), slot: 50, msg_index: 3 });
    }

    #[test]
    fn finds_message_in_previous_slot() {
        let snapshot = snapshot_at(50);
        let previous = snapshot.slot_state(49).unwrap().clone();
        let text = seal_text(&previous, 10, b"previous");

        let found = DecryptSearch::default().run(&snapshot, &text, || false).unwrap();
        assert_eq!(found.slot, 49);
        assert_eq!(found.msg_index, 10);
        assert_eq!(found.plaintext, b"previous");
    }

    #[test]
    fn index_beyond_max_is_not_searched() {
        let snapshot = snapshot_at(50);
        let text = seal_text(snapshot.current(), 11, b"too far");

        let err = DecryptSearch::default().run(&snapshot, &text, || false).unwrap_err();
        assert_eq!(
            err,
            DecryptError::Exhausted {
                tried_slots: vec![50, 49],
                reason: ExhaustionReason::NoCandidateAuthenticated,
            }
        );
    }

    #[test]
    fn window_of_one_only_tries_current() {
        let snapshot = snapshot_at(50);
        let previous = snapshot.slot_state(49).unwrap().clone();
        let text = seal_text(&previous, 0, b"previous");

        let config = ChameleonConfig { slot_window: 1, ..Default::default() };
        let err = DecryptSearch::new(&config).run(&snapshot, &text, || false).unwrap_err();
        assert_eq!(
            err,
            DecryptError::Exhausted {
                tried_slots: vec![50],
                reason: ExhaustionReason::NoCandidateAuthenticated,
            }
        );
    }

    #[test]
    fn empty_text_exhausts() {
        let snapshot = snapshot_at(1);
        let err = DecryptSearch::default().run(&snapshot, "", || false).unwrap_err();
        assert!(matches!(err, DecryptError::Exhausted { .. }));
    }

    #[test]
    fn cancellation_is_checked_between_candidates() {
        let snapshot = snapshot_at(50);
        let polls = Cell::new(0u32);

        let err = DecryptSearch::default()
            .run(&snapshot, "not a message", || {
                polls.set(polls.get() + 1);
                polls.get() > 5
            })
            .unwrap_err();

        assert_eq!(err, DecryptError::Cancelled);
        assert_eq!(polls.get(), 6);
    }

    #[test]
    fn candidate_slots_stop_at_i64_min() {
        let search = DecryptSearch::default();
        assert_eq!(search.candidate_slots(i64::MIN).collect::<Vec<_>>(), vec![i64::MIN]);
        assert_eq!(search.candidate_slots(7).collect::<Vec<_>>(), vec![7, 6]);
    }
}
