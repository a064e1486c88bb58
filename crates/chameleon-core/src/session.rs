//! Session facade tying the clock, ratchet and cipher together.
//!
//! ```text
//! encrypt: lock ─► ensure_advanced ─► snapshot ─► unlock ─► key + codebook ─► seal ─► encode
//! decrypt: lock ─► ensure_advanced ─► snapshot ─► unlock ─► DecryptSearch
//! ```
//!
//! The ratchet is only touched under the mutex. All hashing, shuffling and
//! AEAD work runs on a snapshot after the lock is released, so a slow decrypt
//! search never blocks an encrypt.

use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use chameleon_crypto::{Codebook, derive_session_key, encode, seal};

use crate::{
    config::ChameleonConfig,
    env::Environment,
    error::{ConfigError, DecryptError, EncryptError, SlotError},
    lock_store::LockStore,
    ratchet::{Ratchet, RatchetSnapshot},
    search::{DecryptSearch, DecryptedMessage},
    slot_clock::SlotClock,
};

/// An encrypted message and the coordinates it was sealed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMessage {
    /// Symbol text to hand to the recipient
    pub text: String,
    /// Slot whose state sealed the message
    pub slot: i64,
    /// Message index within the slot
    pub msg_index: u64,
}

/// Mutable session state, guarded by the session mutex.
#[derive(Debug, Default)]
struct SessionState {
    ratchet: Ratchet,
    /// Next index handed out by `encrypt_next`
    next_index: u64,
    /// Slot `next_index` belongs to
    index_slot: Option<i64>,
}

/// Why no snapshot could be taken.
enum Unavailable {
    NotInitialized,
    Locked,
    Clock(SlotError),
}

impl From<Unavailable> for EncryptError {
    fn from(reason: Unavailable) -> Self {
        match reason {
            Unavailable::NotInitialized => Self::NotInitialized,
            Unavailable::Locked => Self::RollbackLocked,
            Unavailable::Clock(err) => Self::Clock(err),
        }
    }
}

impl From<Unavailable> for DecryptError {
    fn from(reason: Unavailable) -> Self {
        match reason {
            Unavailable::NotInitialized => Self::NotInitialized,
            Unavailable::Locked => Self::RollbackLocked,
            Unavailable::Clock(err) => Self::Clock(err),
        }
    }
}

/// A Chameleon session.
///
/// Owns one ratchet. Safe to share across threads (`Arc<Chameleon<..>>`).
pub struct Chameleon<E: Environment, S: LockStore> {
    clock: SlotClock<E, S>,
    config: ChameleonConfig,
    search: DecryptSearch,
    state: Mutex<SessionState>,
}

impl<E: Environment, S: LockStore> Chameleon<E, S> {
    /// Create an uninitialized session.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `config` fails validation.
    pub fn new(env: E, store: S, config: ChameleonConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            clock: SlotClock::new(env, store, config.slot_duration_ms)?,
            search: DecryptSearch::new(&config),
            config,
            state: Mutex::new(SessionState::default()),
        })
    }

    /// Derive the seed from the mnemonic and populate the ratchet.
    ///
    /// Re-initializing an active session restarts from the current slot.
    pub fn init(&self, mnemonic: &str, passphrase: &str) -> Result<(), SlotError> {
        let mut state = self.lock_state();
        state.ratchet.init(mnemonic, passphrase, &self.clock)?;
        state.next_index = 0;
        state.index_slot = None;
        Ok(())
    }

    /// Advance the ratchet to the current slot. Encrypt and decrypt call this
    /// themselves.
    pub fn ensure_advanced(&self) -> Result<(), SlotError> {
        self.lock_state().ratchet.ensure_advanced(&self.clock)
    }

    /// Encrypt `plaintext` under the current slot and `msg_index`.
    ///
    /// Indices above `max_msg_index` are accepted but the recipient will never
    /// search them.
    pub fn encrypt(&self, plaintext: &str, msg_index: u64) -> Result<String, EncryptError> {
        self.encrypt_with_info(plaintext, msg_index).map(|message| message.text)
    }

    /// Like [`Self::encrypt`], also reporting the slot used.
    pub fn encrypt_with_info(
        &self,
        plaintext: &str,
        msg_index: u64,
    ) -> Result<EncryptedMessage, EncryptError> {
        let snapshot = {
            let mut state = self.lock_state();
            self.advanced_snapshot(&mut state)?
        };

        Ok(self.seal_text(&snapshot, plaintext, msg_index))
    }

    /// Encrypt with the next unused index of the current slot.
    ///
    /// The counter restarts at zero whenever the slot changes.
    ///
    /// # Errors
    ///
    /// `MessageIndexExhausted` once `max_msg_index` has been handed out in
    /// this slot.
    pub fn encrypt_next(&self, plaintext: &str) -> Result<EncryptedMessage, EncryptError> {
        let (snapshot, msg_index) = {
            let mut state = self.lock_state();
            let snapshot = self.advanced_snapshot(&mut state)?;
            let slot = snapshot.slot();

            if state.index_slot != Some(slot) {
                state.index_slot = Some(slot);
                state.next_index = 0;
            }

            if state.next_index > self.config.max_msg_index {
                return Err(EncryptError::MessageIndexExhausted {
                    slot,
                    max: self.config.max_msg_index,
                });
            }

            let msg_index = state.next_index;
            state.next_index += 1;
            (snapshot, msg_index)
        };

        Ok(self.seal_text(&snapshot, plaintext, msg_index))
    }

    /// Decrypt symbol text. Invalid UTF-8 in the plaintext is replaced with
    /// U+FFFD.
    pub fn decrypt(&self, text: &str) -> Result<String, DecryptError> {
        self.decrypt_with_info(text)
            .map(|message| String::from_utf8_lossy(&message.plaintext).into_owned())
    }

    /// Decrypt symbol text, reporting the slot and index that matched.
    pub fn decrypt_with_info(&self, text: &str) -> Result<DecryptedMessage, DecryptError> {
        self.decrypt_cancellable(text, &AtomicBool::new(false))
    }

    /// Decrypt, giving up with `Cancelled` once `cancel` is set.
    ///
    /// Leading and trailing whitespace around the symbol text is ignored.
    pub fn decrypt_cancellable(
        &self,
        text: &str,
        cancel: &AtomicBool,
    ) -> Result<DecryptedMessage, DecryptError> {
        let snapshot = {
            let mut state = self.lock_state();
            self.advanced_snapshot(&mut state)?
        };

        self.search.run(&snapshot, text.trim(), || cancel.load(Ordering::Relaxed))
    }

    /// Slot the ratchet currently holds, for display.
    pub fn current_slot(&self) -> Option<i64> {
        self.lock_state().ratchet.current_slot()
    }

    /// Returns true if the ratchet was wiped or a rollback marker is
    /// persisted.
    pub fn is_locked(&self) -> bool {
        if self.lock_state().ratchet.is_locked() {
            return true;
        }

        match self.clock.is_locked() {
            Ok(locked) => locked,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read rollback lock");
                false
            },
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &ChameleonConfig {
        &self.config
    }

    /// The slot clock (and through it the environment and lock store).
    pub fn clock(&self) -> &SlotClock<E, S> {
        &self.clock
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn advanced_snapshot(&self, state: &mut SessionState) -> Result<RatchetSnapshot, Unavailable> {
        state.ratchet.ensure_advanced(&self.clock).map_err(Unavailable::Clock)?;

        state.ratchet.snapshot().ok_or_else(|| {
            if state.ratchet.is_locked() { Unavailable::Locked } else { Unavailable::NotInitialized }
        })
    }

    fn seal_text(
        &self,
        snapshot: &RatchetSnapshot,
        plaintext: &str,
        msg_index: u64,
    ) -> EncryptedMessage {
        let slot_state = snapshot.current();
        let key = derive_session_key(slot_state, msg_index);
        let envelope = seal(&key, plaintext.as_bytes(), self.clock.env().random_nonce());
        let text = encode(&envelope.to_bytes(), &Codebook::derive(slot_state, msg_index));

        tracing::debug!(slot = snapshot.slot(), msg_index, symbols = envelope.len(), "Message sealed");

        EncryptedMessage { text, slot: snapshot.slot(), msg_index }
    }
}
