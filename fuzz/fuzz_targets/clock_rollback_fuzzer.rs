//! Fuzz target for the slot clock and rollback lockout
//!
//! Drives a session through arbitrary clock moves (forwards, backwards,
//! within a slot) and simulated restarts.
//!
//! # Invariants
//!
//! - Slots reported by the session never decrease
//! - Once a rollback is reported, every later operation fails until the
//!   marker is cleared, including after a restart
//! - Clearing the marker restores service without a restart

#![no_main]

use arbitrary::Arbitrary;
use chameleon_core::{LockStore, MemoryLockStore};
use chameleon_harness::{ManualEnv, TEST_MNEMONIC, session};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Step {
    Advance(i32),
    Encrypt,
    Restart,
    Unlock,
}

fuzz_target!(|steps: Vec<Step>| {
    let env = ManualEnv::at_slot(0, 1_000_000);
    let store = MemoryLockStore::new();
    let Ok(mut chameleon) = session(&env, store.clone()) else {
        return;
    };
    let mut locked = chameleon.init(TEST_MNEMONIC, "").is_err();
    let mut last_slot = chameleon.current_slot();

    for step in steps.into_iter().take(64) {
        match step {
            Step::Advance(millis) => env.advance_millis(i64::from(millis)),
            Step::Encrypt => {
                let result = chameleon.encrypt("tick", 0);
                if locked {
                    assert!(result.is_err());
                } else if result.as_ref().is_err_and(|e| e.is_rollback()) {
                    locked = true;
                } else {
                    let slot = chameleon.current_slot();
                    assert!(slot >= last_slot);
                    last_slot = slot;
                }
            },
            Step::Restart => {
                let Ok(restarted) = session(&env, store.clone()) else {
                    return;
                };
                chameleon = restarted;
                let result = chameleon.init(TEST_MNEMONIC, "");
                if locked {
                    assert!(result.is_err());
                } else if result.is_err() {
                    locked = true;
                } else {
                    last_slot = chameleon.current_slot();
                }
            },
            Step::Unlock => {
                let _ = store.clear_lock();
                if locked {
                    // INVARIANT: clearing the marker restores service, even
                    // to the session that detected the rollback
                    assert!(chameleon.init(TEST_MNEMONIC, "").is_ok());
                    locked = false;
                    last_slot = chameleon.current_slot();
                }
            },
        }
    }
});
