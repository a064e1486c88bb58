//! Fuzz target for symbol decoding
//!
//! Feeds arbitrary text through `decode` and `decode_envelope` under an
//! arbitrary codebook to find:
//! - Panics in grapheme splitting or reverse lookup
//! - Envelopes accepted below the minimum length
//! - Decoded bytes that do not re-encode to the same text
//!
//! The fuzzer should NEVER panic. Foreign text must return an error.

#![no_main]

use arbitrary::Arbitrary;
use chameleon_crypto::{
    Codebook, CryptoError, MIN_ENVELOPE_LEN, SlotState, decode, decode_envelope, encode,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    state: [u8; 32],
    msg_index: u8,
    text: String,
}

fuzz_target!(|input: Input| {
    let codebook = Codebook::derive(&SlotState::from_bytes(input.state), u64::from(input.msg_index));

    match decode(&input.text, &codebook) {
        Ok(bytes) => {
            // INVARIANT: decoding is the exact inverse of encoding
            assert_eq!(encode(&bytes, &codebook), input.text);
        },
        Err(err) => assert!(matches!(err, CryptoError::UnknownSymbol { .. })),
    }

    if let Ok(envelope) = decode_envelope(&input.text, &codebook) {
        // INVARIANT: no envelope shorter than nonce + tag
        assert!(envelope.len() >= MIN_ENVELOPE_LEN);
    }
});
