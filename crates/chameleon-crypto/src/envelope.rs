//! Authenticated encryption using ChaCha20-Poly1305
//!
//! All functions are pure - the nonce must be provided by the caller.
//! This enables deterministic testing; production callers draw it from a
//! cryptographically secure source.
//!
//! Wire layout (fixed order, no length prefixes):
//!
//! ```text
//! ┌────────────┬──────────────────────┬────────────┐
//! │ nonce (12) │ ciphertext (0..n)    │ tag (16)   │
//! └────────────┴──────────────────────┴────────────┘
//! ```

use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};

use crate::{error::CryptoError, session_key::SessionKey};

/// Nonce size in bytes
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag size in bytes
pub const TAG_SIZE: usize = 16;

/// Smallest valid envelope (empty plaintext)
pub const MIN_ENVELOPE_LEN: usize = NONCE_SIZE + TAG_SIZE;

/// Sealed message: nonce, ciphertext body and detached tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// The 12-byte nonce
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext without the tag (same length as the plaintext)
    pub ciphertext: Vec<u8>,
    /// The 16-byte Poly1305 tag
    pub tag: [u8; TAG_SIZE],
}

impl Envelope {
    /// Serialize as `nonce ‖ ciphertext ‖ tag`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes.extend_from_slice(&self.tag);
        bytes
    }

    /// Split `nonce ‖ ciphertext ‖ tag`.
    ///
    /// # Errors
    ///
    /// - `EnvelopeTooShort`: fewer than [`MIN_ENVELOPE_LEN`] bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < MIN_ENVELOPE_LEN {
            return Err(CryptoError::EnvelopeTooShort { len: bytes.len(), min: MIN_ENVELOPE_LEN });
        }

        let (nonce, rest) = bytes.split_at(NONCE_SIZE);
        let (ciphertext, tag) = rest.split_at(rest.len() - TAG_SIZE);

        let mut envelope =
            Self { nonce: [0u8; NONCE_SIZE], ciphertext: ciphertext.to_vec(), tag: [0u8; TAG_SIZE] };
        envelope.nonce.copy_from_slice(nonce);
        envelope.tag.copy_from_slice(tag);
        Ok(envelope)
    }

    /// Serialized length in bytes.
    pub fn len(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len() + TAG_SIZE
    }

    /// Always false: an envelope carries at least nonce and tag.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Encrypt `plaintext` under `key` with the caller's `nonce`.
///
/// # Security
///
/// - Caller MUST provide a fresh random nonce per message in production
/// - Keys are per (slot, index), so nonce reuse only matters within one key
pub fn seal(key: &SessionKey, plaintext: &[u8], nonce: [u8; NONCE_SIZE]) -> Envelope {
    let cipher = ChaCha20Poly1305::new(key.key().into());

    let Ok(mut sealed) = cipher.encrypt(Nonce::from_slice(&nonce), plaintext) else {
        unreachable!("ChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    let body_len = sealed.len() - TAG_SIZE;
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&sealed[body_len..]);
    sealed.truncate(body_len);

    Envelope { nonce, ciphertext: sealed, tag }
}

/// Decrypt and verify an envelope.
///
/// # Errors
///
/// - `AuthenticationFailed`: wrong key or any modified byte. The error does
///   not say which.
pub fn open(key: &SessionKey, envelope: &Envelope) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new(key.key().into());

    let mut sealed = Vec::with_capacity(envelope.ciphertext.len() + TAG_SIZE);
    sealed.extend_from_slice(&envelope.ciphertext);
    sealed.extend_from_slice(&envelope.tag);

    cipher
        .decrypt(Nonce::from_slice(&envelope.nonce), sealed.as_slice())
        .map_err(|_| CryptoError::AuthenticationFailed)
}
