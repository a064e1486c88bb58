//! Redb-backed durable lock store.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. The
//! marker survives process restarts, which is what makes the lockout
//! permanent.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};

use super::{LockStore, RollbackLock, StorageError};

/// Table: rollback_locks
/// Key: device id
/// Value: CBOR-encoded RollbackLock
const LOCKS: TableDefinition<&str, &[u8]> = TableDefinition::new("rollback_locks");

/// Table: highest_slots
/// Key: device id
/// Value: highest slot observed on that device
const HIGHEST_SLOTS: TableDefinition<&str, i64> = TableDefinition::new("highest_slots");

/// Durable lock store backed by Redb.
///
/// Records are keyed by device id, so one file can serve several profiles.
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbLockStore {
    db: Arc<Database>,
    device_id: Arc<str>,
}

impl RedbLockStore {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates tables if they don't exist (`rollback_locks`,
    /// `highest_slots`).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>, device_id: &str) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(|e| StorageError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(LOCKS).map_err(|e| StorageError::Io(e.to_string()))?;
            let _ = txn.open_table(HIGHEST_SLOTS).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db), device_id: Arc::from(device_id) })
    }

    /// Device id this store reads and writes.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

impl LockStore for RedbLockStore {
    fn load_lock(&self) -> Result<Option<RollbackLock>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(LOCKS).map_err(|e| StorageError::Io(e.to_string()))?;

        let Some(value) =
            table.get(&*self.device_id).map_err(|e| StorageError::Io(e.to_string()))?
        else {
            return Ok(None);
        };

        let lock: RollbackLock = ciborium::from_reader(value.value())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        Ok(Some(lock))
    }

    fn store_lock(&self, lock: &RollbackLock) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;

        {
            let mut table = txn.open_table(LOCKS).map_err(|e| StorageError::Io(e.to_string()))?;

            let exists = table
                .get(&*self.device_id)
                .map_err(|e| StorageError::Io(e.to_string()))?
                .is_some();

            if !exists {
                let mut bytes = Vec::new();
                ciborium::into_writer(lock, &mut bytes)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;

                table
                    .insert(&*self.device_id, bytes.as_slice())
                    .map_err(|e| StorageError::Io(e.to_string()))?;
            }
        }

        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }

    fn clear_lock(&self) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;

        {
            let mut locks = txn.open_table(LOCKS).map_err(|e| StorageError::Io(e.to_string()))?;
            locks.remove(&*self.device_id).map_err(|e| StorageError::Io(e.to_string()))?;

            let mut highest =
                txn.open_table(HIGHEST_SLOTS).map_err(|e| StorageError::Io(e.to_string()))?;
            highest.remove(&*self.device_id).map_err(|e| StorageError::Io(e.to_string()))?;
        }

        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }

    fn load_highest_slot(&self) -> Result<Option<i64>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(HIGHEST_SLOTS).map_err(|e| StorageError::Io(e.to_string()))?;

        let slot = table
            .get(&*self.device_id)
            .map_err(|e| StorageError::Io(e.to_string()))?
            .map(|guard| guard.value());

        Ok(slot)
    }

    fn store_highest_slot(&self, slot: i64) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;

        {
            let mut table =
                txn.open_table(HIGHEST_SLOTS).map_err(|e| StorageError::Io(e.to_string()))?;

            let current = table
                .get(&*self.device_id)
                .map_err(|e| StorageError::Io(e.to_string()))?
                .map(|guard| guard.value());

            if current.is_none_or(|highest| slot > highest) {
                table
                    .insert(&*self.device_id, slot)
                    .map_err(|e| StorageError::Io(e.to_string()))?;
            }
        }

        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }
}
