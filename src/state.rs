//! Shared operation-state cell.
//!
//! The dispatcher is the only writer. Consumers that poll from another
//! context hold a [`StateWatch`], which only reads.

use crate::event::OperationState;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Atomic holder for the current [`OperationState`].
#[derive(Debug, Default)]
pub struct StateCell {
    raw: AtomicU8,
}

impl StateCell {
    /// Create a cell holding `Busy`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn load(&self) -> OperationState {
        OperationState::from_raw(self.raw.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: OperationState) {
        self.raw.store(state.as_raw(), Ordering::Release);
    }
}

/// Read-only handle on a bridge's operation state.
///
/// Cloneable and `Send`, so a consumer thread can poll the outcome of the
/// last dispatch without borrowing the bridge.
#[derive(Debug, Clone)]
pub struct StateWatch {
    cell: Arc<StateCell>,
}

impl StateWatch {
    pub(crate) fn new(cell: Arc<StateCell>) -> Self {
        Self { cell }
    }

    /// Outcome of the last completed dispatch.
    pub fn get(&self) -> OperationState {
        self.cell.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cell_is_busy() {
        assert_eq!(StateCell::new().load(), OperationState::Busy);
    }

    #[test]
    fn test_store_then_load() {
        let cell = StateCell::new();
        cell.store(OperationState::TxDone);
        assert_eq!(cell.load(), OperationState::TxDone);
    }

    #[test]
    fn test_watch_sees_updates_across_threads() {
        let cell = Arc::new(StateCell::new());
        let watch = StateWatch::new(cell.clone());

        cell.store(OperationState::RxTimeout);
        let seen = std::thread::spawn(move || watch.get()).join().unwrap();
        assert_eq!(seen, OperationState::RxTimeout);
    }
}
