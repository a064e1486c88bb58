//! Fuzz target for the full decrypt pipeline
//!
//! # Strategy
//!
//! - Raw text: arbitrary strings through `Chameleon::decrypt`
//! - Valid messages: sealed by the same session, optionally corrupted by
//!   swapping one symbol
//! - Clock moves between encrypt and decrypt
//!
//! # Invariants
//!
//! - Decrypt never panics
//! - An untouched message decrypts to its plaintext while within one slot
//! - A message with a swapped symbol never decrypts to something else

#![no_main]

use arbitrary::Arbitrary;
use chameleon_core::{DecryptError, MemoryLockStore};
use chameleon_harness::{ManualEnv, TEST_MNEMONIC, session};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Action {
    RawText(String),
    Valid { plaintext: String, msg_index: u8, slots_later: u8 },
    Corrupted { plaintext: String, msg_index: u8, position: u16, replacement: char },
}

#[derive(Debug, Arbitrary)]
struct Scenario {
    rng_seed: u64,
    start_slot: u32,
    actions: Vec<Action>,
}

fuzz_target!(|scenario: Scenario| {
    let env = ManualEnv::at_slot(scenario.rng_seed, i64::from(scenario.start_slot));
    let Ok(chameleon) = session(&env, MemoryLockStore::new()) else {
        return;
    };
    if chameleon.init(TEST_MNEMONIC, "").is_err() {
        return;
    }

    for action in scenario.actions.into_iter().take(8) {
        match action {
            Action::RawText(text) => {
                let _ = chameleon.decrypt(&text);
            },
            Action::Valid { plaintext, msg_index, slots_later } => {
                let msg_index = u64::from(msg_index % 11);
                let Ok(text) = chameleon.encrypt(&plaintext, msg_index) else {
                    continue;
                };

                let slots_later = i64::from(slots_later % 4);
                env.advance_slots(slots_later);

                let result = chameleon.decrypt(&text);
                if slots_later < 2 {
                    assert_eq!(result, Ok(plaintext));
                } else {
                    assert!(matches!(result, Err(DecryptError::Exhausted { .. })));
                }
            },
            Action::Corrupted { plaintext, msg_index, position, replacement } => {
                let Ok(text) = chameleon.encrypt(&plaintext, u64::from(msg_index % 11)) else {
                    continue;
                };

                let mut symbols: Vec<String> = text.chars().map(String::from).collect();
                let position = usize::from(position) % symbols.len();
                if symbols[position].starts_with(replacement) {
                    continue;
                }
                symbols[position] = replacement.to_string();

                // INVARIANT: a tampered message never authenticates
                assert!(chameleon.decrypt(&symbols.concat()).is_err());
            },
        }
    }
});
