use std::sync::{Arc, Mutex, PoisonError};

use super::{LockStore, RollbackLock, StorageError};

/// In-memory lock store for testing and simulation
///
/// All state is wrapped in Arc<Mutex<>>, so clones share one record. Handing
/// a clone to a second [`crate::Chameleon`] models a process restart on the
/// same device.
#[derive(Clone, Default)]
pub struct MemoryLockStore {
    inner: Arc<Mutex<MemoryLockStoreInner>>,
}

#[derive(Default)]
struct MemoryLockStoreInner {
    lock: Option<RollbackLock>,
    highest_slot: Option<i64>,
}

impl MemoryLockStore {
    /// Create an empty, unlocked store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already carries a rollback marker.
    pub fn locked(lock: RollbackLock) -> Self {
        let store = Self::new();
        store.with_inner(|inner| {
            inner.lock = Some(lock);
            inner.highest_slot = Some(lock.highest_slot);
        });
        store
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut MemoryLockStoreInner) -> T) -> T {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut inner)
    }
}

impl LockStore for MemoryLockStore {
    fn load_lock(&self) -> Result<Option<RollbackLock>, StorageError> {
        Ok(self.with_inner(|inner| inner.lock))
    }

    fn store_lock(&self, lock: &RollbackLock) -> Result<(), StorageError> {
        self.with_inner(|inner| {
            inner.lock.get_or_insert(*lock);
        });
        Ok(())
    }

    fn clear_lock(&self) -> Result<(), StorageError> {
        self.with_inner(|inner| {
            inner.lock = None;
            inner.highest_slot = None;
        });
        Ok(())
    }

    fn load_highest_slot(&self) -> Result<Option<i64>, StorageError> {
        Ok(self.with_inner(|inner| inner.highest_slot))
    }

    fn store_highest_slot(&self, slot: i64) -> Result<(), StorageError> {
        self.with_inner(|inner| {
            inner.highest_slot = Some(inner.highest_slot.map_or(slot, |h| h.max(slot)));
        });
        Ok(())
    }
}
