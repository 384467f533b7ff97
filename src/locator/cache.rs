//! The Cold/Warm cached-address state machine.
//!
//! Kept as a single mutable cell with no locking: a [`crate::locator::GrubCounterLocator`]
//! owns exactly one of these for its whole lifetime, and the crate's
//! concurrency model forbids polling the same locator from two threads at
//! once.

use crate::primitives::Address32;

#[derive(Clone, Copy, Debug)]
enum State {
    Cold,
    Warm { address: Address32, last_value: u32 },
}

pub(crate) struct LocatorCache {
    state: State,
}

impl LocatorCache {
    pub fn new() -> Self {
        Self { state: State::Cold }
    }

    /// The last known `(address, value)` pair without triggering a read, or
    /// `None` if the cache is Cold.
    pub fn current(&self) -> Option<(Address32, u32)> {
        match self.state {
            State::Cold => None,
            State::Warm { address, last_value } => Some((address, last_value)),
        }
    }

    /// Adopts a freshly scanned `(address, value)` pair, entering Warm.
    pub fn set(&mut self, address: Address32, value: u32) {
        log::debug!("locator cache warming at {address} with value {value}");
        self.state = State::Warm {
            address,
            last_value: value,
        };
    }

    /// Drops back to Cold. A no-op (and silent) if already Cold.
    pub fn invalidate(&mut self) {
        if matches!(self.state, State::Warm { .. }) {
            log::debug!("locator cache invalidated");
        }
        self.state = State::Cold;
    }

    /// Applies a value freshly read at the cached address while Warm.
    ///
    /// Returns `Some(v)` if the cache stays Warm (the caller should return
    /// `v` directly, no rescan needed); returns `None` and drops to Cold if
    /// the value moved backwards or jumped by more than one, in which case
    /// the caller must perform a full rescan.
    ///
    /// Must only be called while Warm; the caller is expected to have
    /// already special-cased `last_value == 0` before reading, since that
    /// case skips straight to a rescan without calling this at all.
    pub fn observe(&mut self, v: u32) -> Option<u32> {
        let State::Warm { address, last_value } = self.state else {
            return None;
        };

        if v < last_value || v > last_value + 1 {
            log::debug!("locator cache invalidated: value moved from {last_value} to {v}");
            self.state = State::Cold;
            return None;
        }

        self.state = State::Warm {
            address,
            last_value: v,
        };
        Some(v)
    }
}
