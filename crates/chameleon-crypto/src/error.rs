//! Error types for the cryptographic primitives.

use thiserror::Error;

/// Errors produced by envelope parsing, symbol decoding and AEAD opening.
///
/// All three are recoverable: a decryptor searching several candidate
/// codebooks treats each as "not this candidate" and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Decoded byte stream is too short to hold nonce and tag
    #[error("envelope too short: {len} bytes, need at least {min}")]
    EnvelopeTooShort {
        /// Number of bytes actually decoded
        len: usize,
        /// Minimum envelope length
        min: usize,
    },

    /// Symbol is not part of the codebook
    #[error("unknown symbol {symbol:?} at position {position}")]
    UnknownSymbol {
        /// The grapheme that failed to map
        symbol: String,
        /// Index of the grapheme in the input
        position: usize,
    },

    /// AEAD tag did not verify (wrong key, wrong codebook or tampered data)
    #[error("authentication failed")]
    AuthenticationFailed,
}

impl CryptoError {
    /// Returns true if the input did not belong to the codebook at all.
    ///
    /// Decode failures happen before any key is touched, so a caller can
    /// skip straight to the next candidate without attempting AEAD.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::EnvelopeTooShort { .. } | Self::UnknownSymbol { .. })
    }
}
