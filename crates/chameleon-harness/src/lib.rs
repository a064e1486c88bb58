//! Deterministic simulation harness for Chameleon testing.
//!
//! [`ManualEnv`] replaces the wall clock and the OS RNG so scenarios (slot
//! expiry, clock rollback, restarts) run identically every time. A "restart"
//! is modelled by building a new [`Chameleon`] over the same lock store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod manual_env;

use chameleon_core::{Chameleon, ChameleonConfig, ConfigError, LockStore, MemoryLockStore};
pub use manual_env::ManualEnv;

/// Mnemonic used across scenario tests (BIP-39 test vector)
pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// Session over `env` and `store` with the default configuration.
pub fn session<S: LockStore>(
    env: &ManualEnv,
    store: S,
) -> Result<Chameleon<ManualEnv, S>, ConfigError> {
    Chameleon::new(env.clone(), store, ChameleonConfig::default())
}

/// Initialized session over a fresh in-memory store.
pub fn initialized_session(
    env: &ManualEnv,
    mnemonic: &str,
) -> Result<Chameleon<ManualEnv, MemoryLockStore>, Box<dyn std::error::Error>> {
    let session = session(env, MemoryLockStore::new())?;
    session.init(mnemonic, "")?;
    Ok(session)
}
