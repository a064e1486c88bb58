//! Chameleon core: the time-slot ratchet and everything that drives it.
//!
//! ```text
//! Environment (wall clock, RNG)      LockStore (persisted rollback marker)
//!           │                                │
//!           └──────────► SlotClock ◄─────────┘
//!                           │  current_slot()
//!                           ▼
//!                        Ratchet  (previous, current, slot)
//!                           │  snapshot()
//!              ┌────────────┴────────────┐
//!              ▼                         ▼
//!        encrypt (seal)           DecryptSearch (slots × indices)
//! ```
//!
//! [`Chameleon`] wires these together behind a mutex and is the only type
//! most callers need.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod lock_store;
pub mod ratchet;
pub mod search;
pub mod session;
pub mod slot_clock;
pub mod system_env;

pub use config::ChameleonConfig;
pub use env::Environment;
pub use error::{ConfigError, DecryptError, EncryptError, ExhaustionReason, SlotError};
pub use lock_store::{LockStore, MemoryLockStore, RedbLockStore, RollbackLock, StorageError};
pub use ratchet::{Ratchet, RatchetSnapshot};
pub use search::{DecryptSearch, DecryptedMessage};
pub use session::{Chameleon, EncryptedMessage};
pub use slot_clock::{SlotClock, SlotSource};
pub use system_env::SystemEnv;
