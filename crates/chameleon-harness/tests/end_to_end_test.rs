//! End-to-end encrypt/decrypt scenarios.

use chameleon_core::{DecryptError, ExhaustionReason, MemoryLockStore};
use chameleon_crypto::{Codebook, MIN_ENVELOPE_LEN, SlotState, decode, derive_seed};
use chameleon_harness::{ManualEnv, TEST_MNEMONIC, initialized_session, session};
use proptest::prelude::*;

#[test]
fn hello_round_trip() {
    let env = ManualEnv::at_slot(1, 29_000_000);
    let chameleon = initialized_session(&env, TEST_MNEMONIC).unwrap();

    let text = chameleon.encrypt("hello", 0).unwrap();
    assert_eq!(chameleon.decrypt(&text), Ok("hello".to_string()));

    // Symbol text decodes to nonce + ciphertext + tag under the slot codebook
    let seed = derive_seed(TEST_MNEMONIC, "");
    let state = SlotState::from_seed(&seed, env.slot());
    let bytes = decode(&text, &Codebook::derive(&state, 0)).unwrap();
    assert!(bytes.len() >= MIN_ENVELOPE_LEN);
    assert_eq!(bytes.len(), MIN_ENVELOPE_LEN + "hello".len());
}

#[test]
fn sender_and_receiver_devices() {
    let sender_env = ManualEnv::at_slot(1, 5_000);
    let receiver_env = ManualEnv::at_slot(2, 5_000);
    let sender = initialized_session(&sender_env, TEST_MNEMONIC).unwrap();
    let receiver = initialized_session(&receiver_env, TEST_MNEMONIC).unwrap();

    for (index, message) in ["first", "", "ünïcødé ✓ 你好", "a longer message with spaces"].iter().enumerate() {
        let text = sender.encrypt(message, index as u64).unwrap();
        assert_eq!(receiver.decrypt(&text).as_deref(), Ok(*message));
    }
}

#[test]
fn receiver_one_slot_ahead_still_decrypts() {
    let sender_env = ManualEnv::at_slot(1, 5_000);
    let receiver_env = ManualEnv::at_slot(2, 5_001);
    let sender = initialized_session(&sender_env, TEST_MNEMONIC).unwrap();
    let receiver = initialized_session(&receiver_env, TEST_MNEMONIC).unwrap();

    let text = sender.encrypt("late", 7).unwrap();
    let opened = receiver.decrypt_with_info(&text).unwrap();
    assert_eq!((opened.slot, opened.msg_index), (5_000, 7));
}

#[test]
fn wrong_mnemonic_exhausts() {
    let env = ManualEnv::at_slot(1, 100);
    let sender = initialized_session(&env, TEST_MNEMONIC).unwrap();
    let stranger = initialized_session(
        &env,
        "legal winner thank year wave sausage worth useful legal winner thank yellow",
    )
    .unwrap();

    let text = sender.encrypt("private", 0).unwrap();
    assert_eq!(
        stranger.decrypt(&text),
        Err(DecryptError::Exhausted {
            tried_slots: vec![100, 99],
            reason: ExhaustionReason::NoCandidateAuthenticated,
        })
    );
}

#[test]
fn passphrase_separates_sessions() {
    let env = ManualEnv::at_slot(1, 100);
    let plain = initialized_session(&env, TEST_MNEMONIC).unwrap();
    let protected = session(&env, MemoryLockStore::new()).unwrap();
    protected.init(TEST_MNEMONIC, "TREZOR").unwrap();

    let text = protected.encrypt("guarded", 0).unwrap();
    assert!(plain.decrypt(&text).is_err());
    assert_eq!(protected.decrypt(&text), Ok("guarded".to_string()));
}

#[test]
fn same_seed_same_output() {
    let a = initialized_session(&ManualEnv::at_slot(42, 77), TEST_MNEMONIC).unwrap();
    let b = initialized_session(&ManualEnv::at_slot(42, 77), TEST_MNEMONIC).unwrap();

    assert_eq!(a.encrypt("deterministic", 3), b.encrypt("deterministic", 3));
}

#[test]
fn repeated_plaintext_looks_different() {
    let env = ManualEnv::at_slot(1, 77);
    let chameleon = initialized_session(&env, TEST_MNEMONIC).unwrap();

    let first = chameleon.encrypt("again", 0).unwrap();
    let second = chameleon.encrypt("again", 0).unwrap();
    let other_index = chameleon.encrypt("again", 1).unwrap();

    assert_ne!(first, second);
    assert_ne!(first, other_index);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_printable_ascii_never_decrypts(text in "[!-~]{0,80}") {
        let env = ManualEnv::at_slot(3, 1_000);
        let chameleon = initialized_session(&env, TEST_MNEMONIC).unwrap();

        let result = chameleon.decrypt(&text);
        let is_exhausted = matches!(result, Err(DecryptError::Exhausted { .. }));
        prop_assert!(is_exhausted);
    }

    #[test]
    fn prop_any_plaintext_round_trips(plaintext in "\\PC{0,200}", msg_index in 0u64..=10) {
        let env = ManualEnv::at_slot(3, 1_000);
        let chameleon = initialized_session(&env, TEST_MNEMONIC).unwrap();

        let text = chameleon.encrypt(&plaintext, msg_index).unwrap();
        prop_assert_eq!(chameleon.decrypt(&text), Ok(plaintext));
    }
}
