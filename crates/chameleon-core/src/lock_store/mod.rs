//! Persistence for the rollback marker.
//!
//! Trait-based abstraction over where a device records that its clock was
//! wound back. The trait is synchronous: a slot check happens before every
//! encrypt and decrypt and must not need a runtime.

mod error;
mod memory;
mod redb;

pub use error::StorageError;
pub use memory::MemoryLockStore;
use serde::{Deserialize, Serialize};

pub use self::redb::RedbLockStore;

/// Marker written when a clock rollback is observed.
///
/// Its presence alone locks the device; the fields are kept for display and
/// forensics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackLock {
    /// Highest slot observed before the rollback
    pub highest_slot: i64,
    /// The lower slot that triggered the lock
    pub observed_slot: i64,
}

/// Device-scoped store for the rollback marker and the highest observed
/// slot.
///
/// Must be Clone (shared between the clock and tooling such as an unlock
/// command), Send + Sync, and synchronous. Implementations typically share
/// internal state via Arc, so clones access the same underlying record.
///
/// # Invariants
///
/// - A stored lock stays until `clear_lock` is called. Nothing in the core
///   ever calls it.
/// - `load_highest_slot` never decreases except through `clear_lock`
pub trait LockStore: Clone + Send + Sync + 'static {
    /// Load the rollback marker, `None` if the device is not locked.
    fn load_lock(&self) -> Result<Option<RollbackLock>, StorageError>;

    /// Persist the rollback marker.
    ///
    /// If a marker already exists it is kept: the first rollback is the one
    /// worth recording.
    fn store_lock(&self, lock: &RollbackLock) -> Result<(), StorageError>;

    /// Remove the marker and forget the highest observed slot.
    ///
    /// This is the external "clear" operation. Not reachable from
    /// [`crate::Chameleon`].
    fn clear_lock(&self) -> Result<(), StorageError>;

    /// Highest slot ever recorded for this device.
    fn load_highest_slot(&self) -> Result<Option<i64>, StorageError>;

    /// Record a new highest slot. Lower values are ignored.
    fn store_highest_slot(&self, slot: i64) -> Result<(), StorageError>;
}
