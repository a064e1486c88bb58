//! Forward-only time-slot ratchet.
//!
//! # Security Properties
//!
//! - Forward Secrecy: advancing overwrites (and zeroizes) old slot states;
//!   anything older than `slot - 1` cannot be recomputed from what is held
//! - No seed retention: the seed exists only inside [`Ratchet::init`]
//! - Sequential: slots are reached one hash step at a time, never by jumping
//! - Bounded: a jump past [`MAX_ADVANCE_SLOTS`] is refused rather than
//!   stepped, so an absurd clock cannot pin the session lock
//! - Lockout: any rollback wipes every slot state
//!
//! # States
//!
//! ```text
//!                init ok                      ensure_advanced
//! Uninitialized ────────► Active(prev, curr, T) ◄──────────┐
//!       │                   │   │                          │
//!       │ init: rollback    │   └──────────────────────────┘
//!       ▼                   │ rollback
//!     Locked ◄──────────────┘
//!       │ init ok (after the marker is cleared)
//!       └───────────────────► Active
//! ```

use chameleon_crypto::{SlotState, derive_seed};

use crate::{config::MAX_ADVANCE_SLOTS, error::SlotError, slot_clock::SlotSource};

#[derive(Debug, Default)]
enum RatchetState {
    #[default]
    Uninitialized,
    Active {
        previous: Option<SlotState>,
        current: SlotState,
        slot: i64,
    },
    Locked,
}

/// The ratchet state machine.
///
/// Holds at most two slot states: the current slot's and the previous
/// slot's.
#[derive(Debug, Default)]
pub struct Ratchet {
    state: RatchetState,
}

impl Ratchet {
    /// Create an uninitialized ratchet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the seed, read the current slot and populate the ratchet.
    ///
    /// The states for slot T and T−1 are computed directly from the seed;
    /// the seed is dropped (zeroized) before this returns.
    ///
    /// # Errors
    ///
    /// Any [`SlotError`] from the source. Rollback errors also wipe the
    /// ratchet into the locked state.
    pub fn init(
        &mut self,
        mnemonic: &str,
        passphrase: &str,
        source: &impl SlotSource,
    ) -> Result<(), SlotError> {
        let slot = self.read_slot(source)?;

        let seed = derive_seed(mnemonic, passphrase);
        let previous = SlotState::from_seed(&seed, slot.saturating_sub(1));
        let current = SlotState::from_seed(&seed, slot);
        drop(seed);

        self.state = RatchetState::Active { previous: Some(previous), current, slot };
        tracing::info!(slot, "Ratchet initialized");

        Ok(())
    }

    /// Bring the ratchet up to the source's current slot.
    ///
    /// No-op when uninitialized, locked, or when the clock has not moved
    /// past the held slot.
    ///
    /// # Errors
    ///
    /// Any [`SlotError`] from the source. Rollback errors also wipe the
    /// ratchet into the locked state. [`SlotError::ForwardJump`] leaves the
    /// held states untouched.
    pub fn ensure_advanced(&mut self, source: &impl SlotSource) -> Result<(), SlotError> {
        if !self.is_active() {
            return Ok(());
        }

        let target = self.read_slot(source)?;
        self.advance_to(target)
    }

    /// Step forward one slot at a time until `target`.
    fn advance_to(&mut self, target: i64) -> Result<(), SlotError> {
        let RatchetState::Active { previous, current, slot } = &mut self.state else {
            return Ok(());
        };

        if target <= *slot {
            return Ok(());
        }

        if target.saturating_sub(*slot) > MAX_ADVANCE_SLOTS {
            tracing::warn!(held = *slot, observed = target, "Clock jumped too far ahead");
            return Err(SlotError::ForwardJump {
                held: *slot,
                observed: target,
                max: MAX_ADVANCE_SLOTS,
            });
        }

        let from = *slot;
        while *slot < target {
            let next = current.next();
            *previous = Some(std::mem::replace(current, next));
            *slot += 1;
        }

        tracing::debug!(from, to = target, "Ratchet advanced");
        Ok(())
    }

    /// Read the current slot, wiping on rollback.
    fn read_slot(&mut self, source: &impl SlotSource) -> Result<i64, SlotError> {
        source.current_slot().inspect_err(|e| {
            if e.is_rollback() {
                self.wipe();
            }
        })
    }

    /// Drop every slot state and enter the locked state.
    pub fn wipe(&mut self) {
        if !matches!(self.state, RatchetState::Locked) {
            tracing::warn!("Ratchet wiped");
        }
        self.state = RatchetState::Locked;
    }

    /// Slot state for `target`, only if it is the current or previous slot.
    pub fn slot_state(&self, target: i64) -> Option<&SlotState> {
        match &self.state {
            RatchetState::Active { current, slot, .. } if target == *slot => Some(current),
            RatchetState::Active { previous, slot, .. } if Some(target) == slot.checked_sub(1) => {
                previous.as_ref()
            },
            _ => None,
        }
    }

    /// Current slot, `None` unless active.
    pub fn current_slot(&self) -> Option<i64> {
        match &self.state {
            RatchetState::Active { slot, .. } => Some(*slot),
            _ => None,
        }
    }

    /// Consistent copy of the held states, `None` unless active.
    pub fn snapshot(&self) -> Option<RatchetSnapshot> {
        match &self.state {
            RatchetState::Active { previous, current, slot } => Some(RatchetSnapshot {
                slot: *slot,
                current: current.clone(),
                previous: previous.clone(),
            }),
            _ => None,
        }
    }

    /// Returns true once `init` has succeeded and no rollback occurred since.
    pub fn is_active(&self) -> bool {
        matches!(self.state, RatchetState::Active { .. })
    }

    /// Returns true after a rollback wiped the ratchet.
    pub fn is_locked(&self) -> bool {
        matches!(self.state, RatchetState::Locked)
    }
}

/// Point-in-time copy of an active ratchet.
///
/// Taken under the session lock so current and previous always belong to
/// the same advance step.
#[derive(Debug, Clone)]
pub struct RatchetSnapshot {
    slot: i64,
    current: SlotState,
    previous: Option<SlotState>,
}

impl RatchetSnapshot {
    /// Slot of the current state.
    pub fn slot(&self) -> i64 {
        self.slot
    }

    /// State of the current slot.
    pub fn current(&self) -> &SlotState {
        &self.current
    }

    /// Same rule as [`Ratchet::slot_state`].
    pub fn slot_state(&self, target: i64) -> Option<&SlotState> {
        if target == self.slot {
            Some(&self.current)
        } else if Some(target) == self.slot.checked_sub(1) {
            self.previous.as_ref()
        } else {
            None
        }
    }
}
