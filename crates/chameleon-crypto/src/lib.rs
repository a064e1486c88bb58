//! Chameleon Cryptographic Primitives
//!
//! Cryptographic building blocks for Chameleon. Pure functions with
//! deterministic outputs. Callers provide random bytes (the AEAD nonce) so
//! every operation can be replayed in tests.
//!
//! # Key Lifecycle
//!
//! A mnemonic is stretched once into a seed. The seed yields the slot state
//! for the current and previous time slot and is then dropped. Every later
//! slot state is reached only by hashing the one before it. Each message
//! derives its own AEAD key and its own symbol codebook from the slot state
//! and a message index.
//!
//! ```text
//! Mnemonic + Passphrase
//!        │
//!        ▼
//! PBKDF2-HMAC-SHA512 → Seed (64 bytes, dropped after init)
//!        │
//!        ▼
//! SHA-256(seed ‖ slot) → Slot State ──SHA-256(state ‖ label)──▶ next Slot State
//!        │
//!        ├──▶ SHA-256(state ‖ index) → Session Key → ChaCha20-Poly1305
//!        │
//!        └──▶ SHA-256(state ‖ index) → Fisher–Yates → Codebook
//!                                                        │
//!                                                        ▼
//!                        nonce ‖ ciphertext ‖ tag  ⇄  symbol string
//! ```
//!
//! # Security
//!
//! Forward Secrecy:
//! - Slot states advance by one-way hashing; old states are zeroized
//! - Session keys and seeds are zeroized on drop
//!
//! Authenticity:
//! - ChaCha20-Poly1305 rejects any change to nonce, ciphertext or tag
//! - Wrong slot, wrong index and wrong mnemonic are indistinguishable from
//!   tampering: all surface as [`CryptoError::AuthenticationFailed`]
//!
//! Limitation:
//! - Slot states for the initial slots are computed straight from the seed.
//!   Anyone holding the mnemonic can compute any slot. Forward secrecy holds
//!   against memory compromise of a live device, not against mnemonic
//!   disclosure.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codebook;
pub mod envelope;
mod error;
pub mod seed;
pub mod session_key;
pub mod slot_state;

pub use codebook::{Codebook, SYMBOL_COUNT, decode, decode_envelope, encode, symbol_pool};
pub use envelope::{Envelope, MIN_ENVELOPE_LEN, NONCE_SIZE, TAG_SIZE, open, seal};
pub use error::CryptoError;
pub use seed::{SEED_SIZE, Seed, derive_seed};
pub use session_key::{SessionKey, derive_session_key};
pub use slot_state::{SLOT_STATE_SIZE, SlotState};
