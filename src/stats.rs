//! Dispatch counters.

use crate::event::OperationState;
use serde::Serialize;

/// Running counters kept by an [`IrqBridge`](crate::IrqBridge).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Events passed to `handle_event`.
    pub dispatched: u64,

    /// Terminal outcomes by type
    pub tx_done: u64,
    pub rx_done: u64,
    pub tx_timeout: u64,
    pub rx_timeout: u64,
    pub rx_error: u64,

    /// Dispatches that ended without a terminal outcome.
    pub busy: u64,
    /// Line events with no handler registered.
    pub unconfigured: u64,
    /// Timer events with no handler registered.
    pub timer_ignored: u64,
    /// Received frames clamped to the registered buffer.
    pub rx_truncated: u64,
    /// Received frames with no buffer registered.
    pub rx_unbuffered: u64,
}

impl DispatchStats {
    pub(crate) fn record_outcome(&mut self, state: OperationState) {
        match state {
            OperationState::Busy => self.busy += 1,
            OperationState::TxDone => self.tx_done += 1,
            OperationState::RxDone => self.rx_done += 1,
            OperationState::TxTimeout => self.tx_timeout += 1,
            OperationState::RxTimeout => self.rx_timeout += 1,
            OperationState::RxError => self.rx_error += 1,
        }
    }
}
