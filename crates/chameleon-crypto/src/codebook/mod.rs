//! Per-message byte ↔ symbol codebooks and the encode/decode transform.
//!
//! A codebook is a Fisher–Yates shuffle of the shared [`symbol_pool`],
//! driven by `SHA-256(slot_state ‖ decimal(msg_index))`. For step `i` from
//! 255 down to 1 the swap partner is `digest[i % 32] % (i + 1)`. Byte value
//! `b` encodes as the symbol at shuffled position `b`.
//!
//! Decoding splits text into extended grapheme clusters, so a symbol made of
//! several code points is one unit.

mod pool;

use std::collections::HashMap;

pub use pool::{SYMBOL_COUNT, symbol_pool};
use unicode_segmentation::UnicodeSegmentation;

use crate::{envelope::Envelope, error::CryptoError, slot_state::SlotState};

/// A total bijection between the 256 byte values and 256 pool symbols.
///
/// # Invariants
///
/// - `forward` holds 256 distinct symbols
/// - `reverse[forward[b]] == b` for every byte `b`
#[derive(Debug, Clone)]
pub struct Codebook {
    forward: [&'static str; SYMBOL_COUNT],
    reverse: HashMap<&'static str, u8>,
}

impl Codebook {
    /// Derive the codebook for a slot state and message index.
    pub fn derive(slot_state: &SlotState, msg_index: u64) -> Self {
        Self::from_digest(&slot_state.message_digest(msg_index))
    }

    /// Shuffle the pool with the given digest bytes.
    fn from_digest(digest: &[u8; 32]) -> Self {
        let pool = symbol_pool();
        let mut forward: [&'static str; SYMBOL_COUNT] = std::array::from_fn(|i| pool[i].as_str());

        for i in (1..SYMBOL_COUNT).rev() {
            let j = usize::from(digest[i % digest.len()]) % (i + 1);
            forward.swap(i, j);
        }

        let reverse = forward.iter().zip(0..=u8::MAX).map(|(&symbol, byte)| (symbol, byte)).collect();

        Self { forward, reverse }
    }

    /// Symbol for a byte value.
    pub fn symbol(&self, byte: u8) -> &'static str {
        self.forward[usize::from(byte)]
    }

    /// Byte value for a symbol, if the symbol belongs to this codebook.
    pub fn byte(&self, symbol: &str) -> Option<u8> {
        self.reverse.get(symbol).copied()
    }

    /// The full table, indexed by byte value.
    pub fn symbols(&self) -> &[&'static str; SYMBOL_COUNT] {
        &self.forward
    }
}

/// Map every byte through the codebook and concatenate the symbols.
pub fn encode(bytes: &[u8], codebook: &Codebook) -> String {
    bytes.iter().map(|&b| codebook.symbol(b)).collect()
}

/// Map every grapheme back to its byte value.
///
/// # Errors
///
/// - `UnknownSymbol`: a grapheme is not in the codebook
pub fn decode(text: &str, codebook: &Codebook) -> Result<Vec<u8>, CryptoError> {
    text.graphemes(true)
        .enumerate()
        .map(|(position, symbol)| {
            codebook
                .byte(symbol)
                .ok_or_else(|| CryptoError::UnknownSymbol { symbol: symbol.to_string(), position })
        })
        .collect()
}

/// Decode symbol text and split it into an [`Envelope`].
///
/// # Errors
///
/// - `UnknownSymbol`: a grapheme is not in the codebook
/// - `EnvelopeTooShort`: fewer than 28 bytes decoded
pub fn decode_envelope(text: &str, codebook: &Codebook) -> Result<Envelope, CryptoError> {
    Envelope::from_bytes(&decode(text, codebook)?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::seed::derive_seed;

    fn abandon_state() -> SlotState {
        let seed = derive_seed(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon \
             abandon about",
            "",
        );
        SlotState::from_seed(&seed, 100)
    }

    #[test]
    fn codebook_is_a_bijection() {
        let codebook = Codebook::derive(&abandon_state(), 0);
        let unique: HashSet<&str> = codebook.symbols().iter().copied().collect();
        assert_eq!(unique.len(), SYMBOL_COUNT);

        for byte in 0..=u8::MAX {
            assert_eq!(codebook.byte(codebook.symbol(byte)), Some(byte));
        }
    }

    #[test]
    fn codebook_is_deterministic() {
        let a = Codebook::derive(&abandon_state(), 7);
        let b = Codebook::derive(&abandon_state(), 7);
        assert_eq!(a.symbols(), b.symbols());
    }

    #[test]
    fn codebook_known_answer() {
        let codebook = Codebook::derive(&abandon_state(), 0);
        assert_eq!(codebook.symbols()[..8].concat(), "假放草∅蹈铝≤白");
        assert_eq!(codebook.symbols()[248..].concat(), "黑∪Θ∃ψ夏α漠");
        assert_eq!(encode(b"hello", &codebook), "洋🌟乐乐花");
    }

    #[test]
    fn index_changes_codebook() {
        let state = abandon_state();
        assert_ne!(Codebook::derive(&state, 0).symbols(), Codebook::derive(&state, 1).symbols());
    }

    #[test]
    fn zero_digest_still_shuffles_to_a_bijection() {
        let codebook = Codebook::from_digest(&[0u8; 32]);
        let unique: HashSet<&str> = codebook.symbols().iter().copied().collect();
        assert_eq!(unique.len(), SYMBOL_COUNT);
    }

    #[test]
    fn decode_reports_unknown_symbol_position() {
        let codebook = Codebook::derive(&abandon_state(), 0);
        let mut text = encode(&[1, 2, 3], &codebook);
        text.push('Z');

        assert_eq!(
            decode(&text, &codebook),
            Err(CryptoError::UnknownSymbol { symbol: "Z".to_string(), position: 3 })
        );
    }

    #[test]
    fn decode_treats_multi_codepoint_graphemes_as_one_symbol() {
        let codebook = Codebook::derive(&abandon_state(), 0);
        // Thumbs-up with a skin tone modifier is two code points, one grapheme
        let err = decode("\u{1F44D}\u{1F3FD}", &codebook).unwrap_err();
        assert_eq!(
            err,
            CryptoError::UnknownSymbol { symbol: "\u{1F44D}\u{1F3FD}".to_string(), position: 0 }
        );
    }

    #[test]
    fn decode_empty_is_empty() {
        let codebook = Codebook::derive(&abandon_state(), 0);
        assert_eq!(decode("", &codebook), Ok(Vec::new()));
    }

    #[test]
    fn decode_envelope_rejects_short_streams() {
        let codebook = Codebook::derive(&abandon_state(), 0);
        let text = encode(&[0u8; 27], &codebook);
        assert_eq!(
            decode_envelope(&text, &codebook),
            Err(CryptoError::EnvelopeTooShort { len: 27, min: 28 })
        );
    }
}
