//! Local-clock time-slot source with rollback lockout.
//!
//! A slot is `floor(unix_millis / slot_duration_ms)`. The source remembers
//! the highest slot it has seen (in memory and in the [`LockStore`]). A
//! slot lower than that is treated as an attempt to wind the clock back and
//! read messages after their intended expiry: the device persists a marker
//! and refuses to produce slots until the marker is cleared externally.
//!
//! There is no network time correction. With a corrected source, different
//! devices would disagree on what a rollback is, and the lockout would stop
//! meaning anything.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use crate::{
    env::Environment,
    error::{ConfigError, SlotError},
    lock_store::{LockStore, RollbackLock},
};

/// Anything that can report the current time slot.
///
/// The ratchet depends on this seam rather than on a concrete clock so tests
/// can script slot sequences.
pub trait SlotSource {
    /// Current slot, or why none can be produced.
    fn current_slot(&self) -> Result<i64, SlotError>;
}

/// Sentinel for "no slot observed yet"
const NO_SLOT: i64 = i64::MIN;

/// Time-slot source over an [`Environment`] clock and a [`LockStore`].
pub struct SlotClock<E: Environment, S: LockStore> {
    env: E,
    store: S,
    slot_duration_ms: i64,
    /// Highest slot observed by this process (or loaded from the store)
    highest: AtomicI64,
    /// Set once this clock has seen a persisted marker
    saw_lock: AtomicBool,
}

impl<E: Environment, S: LockStore> SlotClock<E, S> {
    /// Create a clock.
    ///
    /// # Errors
    ///
    /// `ConfigError::SlotDuration` unless `slot_duration_ms` is positive.
    pub fn new(env: E, store: S, slot_duration_ms: i64) -> Result<Self, ConfigError> {
        if slot_duration_ms <= 0 {
            return Err(ConfigError::SlotDuration(slot_duration_ms));
        }

        Ok(Self {
            env,
            store,
            slot_duration_ms,
            highest: AtomicI64::new(NO_SLOT),
            saw_lock: AtomicBool::new(false),
        })
    }

    /// The underlying lock store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The underlying environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Highest slot observed so far, if any.
    pub fn highest_observed(&self) -> Option<i64> {
        match self.highest.load(Ordering::Acquire) {
            NO_SLOT => None,
            slot => Some(slot),
        }
    }

    /// Slot for a wall-clock instant, without any rollback bookkeeping.
    pub fn slot_at(&self, unix_millis: i64) -> i64 {
        unix_millis.div_euclid(self.slot_duration_ms)
    }

    /// Returns true if a rollback marker is persisted.
    pub fn is_locked(&self) -> Result<bool, SlotError> {
        Ok(self.store.load_lock()?.is_some())
    }

    /// Persist the marker and build the error for the caller.
    ///
    /// When the store refuses the marker, the in-memory high-water mark keeps
    /// rejecting the slot and the next call retries the write.
    fn persist_lock(&self, lock: RollbackLock) -> SlotError {
        tracing::error!(
            highest_slot = lock.highest_slot,
            observed_slot = lock.observed_slot,
            "Clock rollback detected, locking device"
        );

        match self.store.store_lock(&lock) {
            Ok(()) => {
                self.saw_lock.store(true, Ordering::Release);
                SlotError::RollbackDetected {
                    observed: lock.observed_slot,
                    highest: lock.highest_slot,
                }
            },
            Err(source) => {
                tracing::error!(error = %source, "Failed to persist rollback lock");
                SlotError::RollbackUnpersisted {
                    observed: lock.observed_slot,
                    highest: lock.highest_slot,
                    source,
                }
            },
        }
    }
}

impl<E: Environment, S: LockStore> SlotSource for SlotClock<E, S> {
    fn current_slot(&self) -> Result<i64, SlotError> {
        match self.store.load_lock()? {
            Some(lock) => {
                self.saw_lock.store(true, Ordering::Release);
                return Err(SlotError::RollbackLocked {
                    highest: lock.highest_slot,
                    observed: lock.observed_slot,
                });
            },
            // Marker cleared externally: forget the in-memory high water too
            None if self.saw_lock.swap(false, Ordering::AcqRel) => {
                tracing::warn!("Rollback lock cleared, resetting high-water mark");
                self.highest.store(NO_SLOT, Ordering::Release);
            },
            None => {},
        }

        if let Some(persisted) = self.store.load_highest_slot()? {
            self.highest.fetch_max(persisted, Ordering::AcqRel);
        }

        let slot = self.slot_at(self.env.unix_millis());
        let highest = self.highest.fetch_max(slot, Ordering::AcqRel);

        if slot < highest {
            return Err(self.persist_lock(RollbackLock { highest_slot: highest, observed_slot: slot }));
        }

        if slot > highest {
            self.store.store_highest_slot(slot)?;
        }

        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::lock_store::{MemoryLockStore, StorageError};

    /// Memory store whose marker writes fail while `fail_lock` is set
    #[derive(Clone, Default)]
    struct FlakyStore {
        inner: MemoryLockStore,
        fail_lock: Arc<AtomicBool>,
    }

    impl LockStore for FlakyStore {
        fn load_lock(&self) -> Result<Option<RollbackLock>, StorageError> {
            self.inner.load_lock()
        }

        fn store_lock(&self, lock: &RollbackLock) -> Result<(), StorageError> {
            if self.fail_lock.load(Ordering::SeqCst) {
                return Err(StorageError::Io("disk full".to_string()));
            }
            self.inner.store_lock(lock)
        }

        fn clear_lock(&self) -> Result<(), StorageError> {
            self.inner.clear_lock()
        }

        fn load_highest_slot(&self) -> Result<Option<i64>, StorageError> {
            self.inner.load_highest_slot()
        }

        fn store_highest_slot(&self, slot: i64) -> Result<(), StorageError> {
            self.inner.store_highest_slot(slot)
        }
    }

    #[derive(Clone)]
    struct TestEnv {
        millis: Arc<AtomicI64>,
    }

    impl TestEnv {
        fn at(millis: i64) -> Self {
            Self { millis: Arc::new(AtomicI64::new(millis)) }
        }

        fn set(&self, millis: i64) {
            self.millis.store(millis, Ordering::SeqCst);
        }
    }

    impl Environment for TestEnv {
        fn unix_millis(&self) -> i64 {
            self.millis.load(Ordering::SeqCst)
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(0x5A);
        }
    }

    #[test]
    fn slot_is_floor_of_minutes() {
        let env = TestEnv::at(125_000);
        let clock = SlotClock::new(env.clone(), MemoryLockStore::new(), 60_000).unwrap();
        assert_eq!(clock.current_slot(), Ok(2));

        env.set(180_000);
        assert_eq!(clock.current_slot(), Ok(3));
    }

    #[test]
    fn negative_time_floors_downwards() {
        let clock = SlotClock::new(TestEnv::at(-1), MemoryLockStore::new(), 60_000).unwrap();
        assert_eq!(clock.current_slot(), Ok(-1));
    }

    #[test]
    fn same_slot_is_not_a_rollback() {
        let env = TestEnv::at(60_000 * 10 + 500);
        let clock = SlotClock::new(env.clone(), MemoryLockStore::new(), 60_000).unwrap();
        assert_eq!(clock.current_slot(), Ok(10));

        // Backwards within the same slot
        env.set(60_000 * 10);
        assert_eq!(clock.current_slot(), Ok(10));
    }

    #[test]
    fn rollback_persists_lock_and_fails_forever() {
        let env = TestEnv::at(60_000 * 10);
        let store = MemoryLockStore::new();
        let clock = SlotClock::new(env.clone(), store.clone(), 60_000).unwrap();
        assert_eq!(clock.current_slot(), Ok(10));

        env.set(60_000 * 5);
        assert_eq!(clock.current_slot(), Err(SlotError::RollbackDetected { observed: 5, highest: 10 }));
        assert_eq!(store.load_lock(), Ok(Some(RollbackLock { highest_slot: 10, observed_slot: 5 })));

        // Moving the clock forward again does not help
        env.set(60_000 * 20);
        assert_eq!(clock.current_slot(), Err(SlotError::RollbackLocked { highest: 10, observed: 5 }));
        assert_eq!(clock.is_locked(), Ok(true));
    }

    #[test]
    fn persisted_high_water_detects_rollback_across_restarts() {
        let store = MemoryLockStore::new();

        let first = SlotClock::new(TestEnv::at(60_000 * 10), store.clone(), 60_000).unwrap();
        assert_eq!(first.current_slot(), Ok(10));
        drop(first);

        let restarted = SlotClock::new(TestEnv::at(60_000 * 9), store, 60_000).unwrap();
        assert_eq!(
            restarted.current_slot(),
            Err(SlotError::RollbackDetected { observed: 9, highest: 10 })
        );
    }

    #[test]
    fn highest_observed_tracks_maximum() {
        let env = TestEnv::at(60_000 * 3);
        let clock = SlotClock::new(env.clone(), MemoryLockStore::new(), 60_000).unwrap();
        assert_eq!(clock.highest_observed(), None);

        clock.current_slot().unwrap();
        env.set(60_000 * 7);
        clock.current_slot().unwrap();
        assert_eq!(clock.highest_observed(), Some(7));
    }

    #[test]
    fn rejects_non_positive_slot_duration() {
        for duration in [0, -60_000] {
            assert!(matches!(
                SlotClock::new(TestEnv::at(0), MemoryLockStore::new(), duration),
                Err(ConfigError::SlotDuration(d)) if d == duration
            ));
        }
    }

    #[test]
    fn unpersisted_marker_is_reported_and_retried() {
        let env = TestEnv::at(60_000 * 1_000);
        let store = FlakyStore::default();
        let clock = SlotClock::new(env.clone(), store.clone(), 60_000).unwrap();
        assert_eq!(clock.current_slot(), Ok(1_000));

        store.fail_lock.store(true, Ordering::SeqCst);
        env.set(60_000 * 990);
        let err = clock.current_slot().unwrap_err();
        assert_eq!(
            err,
            SlotError::RollbackUnpersisted {
                observed: 990,
                highest: 1_000,
                source: StorageError::Io("disk full".to_string()),
            }
        );
        assert!(err.is_rollback());
        assert_eq!(store.load_lock(), Ok(None));

        // Next read retries the write and locks for good
        store.fail_lock.store(false, Ordering::SeqCst);
        assert_eq!(
            clock.current_slot(),
            Err(SlotError::RollbackDetected { observed: 990, highest: 1_000 })
        );
        assert_eq!(
            store.load_lock(),
            Ok(Some(RollbackLock { highest_slot: 1_000, observed_slot: 990 }))
        );
    }

    #[test]
    fn clearing_the_marker_resets_in_memory_high_water() {
        let env = TestEnv::at(60_000 * 1_000);
        let store = MemoryLockStore::new();
        let clock = SlotClock::new(env.clone(), store.clone(), 60_000).unwrap();
        assert_eq!(clock.current_slot(), Ok(1_000));

        env.set(60_000 * 990);
        assert!(clock.current_slot().unwrap_err().is_rollback());
        assert_eq!(clock.current_slot(), Err(SlotError::RollbackLocked { highest: 1_000, observed: 990 }));

        store.clear_lock().unwrap();
        assert_eq!(clock.current_slot(), Ok(990));
        assert_eq!(clock.highest_observed(), Some(990));
        assert_eq!(store.load_lock(), Ok(None));

        // Detection works again from the new baseline
        env.set(60_000 * 980);
        assert_eq!(clock.current_slot(), Err(SlotError::RollbackDetected { observed: 980, highest: 990 }));
    }
}
