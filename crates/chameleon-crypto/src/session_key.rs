//! Per-message AEAD key derivation.

use zeroize::Zeroize;

use crate::slot_state::SlotState;

/// A message key derived from a slot state and message index.
///
/// Used for one seal or one open attempt and then dropped.
pub struct SessionKey {
    /// The 32-byte symmetric key for ChaCha20-Poly1305
    key: [u8; 32],
    /// The message index this key was derived for
    msg_index: u64,
}

impl SessionKey {
    /// 32-byte symmetric key.
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    /// Message index this key was derived for.
    pub fn msg_index(&self) -> u64 {
        self.msg_index
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Derive the session key `SHA-256(slot_state ‖ decimal(msg_index))`.
pub fn derive_session_key(slot_state: &SlotState, msg_index: u64) -> SessionKey {
    SessionKey { key: slot_state.message_digest(msg_index), msg_index }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> SlotState {
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = i as u8;
        }
        SlotState::from_bytes(bytes)
    }

    #[test]
    fn derive_is_deterministic() {
        let a = derive_session_key(&test_state(), 3);
        let b = derive_session_key(&test_state(), 3);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.msg_index(), 3);
    }

    #[test]
    fn different_indices_produce_different_keys() {
        let state = test_state();
        let keys: Vec<_> = (0..=10).map(|i| derive_session_key(&state, i)).collect();
        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                assert_ne!(keys[i].key(), keys[j].key(), "indices {i} and {j} collide");
            }
        }
    }

    #[test]
    fn multi_digit_indices_are_distinct() {
        let state = test_state();
        assert_ne!(derive_session_key(&state, 1).key(), derive_session_key(&state, 10).key());
    }

    #[test]
    fn known_answer() {
        let seed = crate::seed::derive_seed(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon \
             abandon about",
            "",
        );
        let state = SlotState::from_seed(&seed, 100);
        assert_eq!(
            hex::encode(derive_session_key(&state, 0).key()),
            "d7fcf2870b724cfd9dd8ca5a06fcbf321899d1da3264981962c5eec9e540cf3a"
        );
    }
}
