//! Interrupt-to-state bridge.
//!
//! [`IrqBridge`] is the context object a consumer owns for one radio. It
//! holds the dispatch tables the driver fills during
//! [`init`](IrqBridge::init), the outcome of the last dispatch, the last
//! receive metadata and the consumer's receive buffer.
//!
//! # Dispatch
//!
//! 1. The state is reset to `Busy`
//! 2. The event is resolved to a DIO slot or a timer slot
//! 3. The stored handler runs synchronously and reports through
//!    [`RadioEvents`]
//! 4. The resulting state is returned
//!
//! The first outcome a handler reports is final for that dispatch; any
//! further report is logged and dropped, including its frame and metadata.
//!
//! Unconfigured DIO slots are an error. Unconfigured timer slots are a
//! no-op and leave the state at `Busy`: drivers only stash the timers they
//! actually use.
//!
//! # Example
//!
//! ```
//! use sx12xx_irq::{HardwareEvent, IrqBridge, OperationState, RadioEvents};
//!
//! let mut bridge: IrqBridge<Vec<u8>> = IrqBridge::new();
//! bridge
//!     .registrar()
//!     .register_line(0, |ev: &mut dyn RadioEvents| ev.on_rx_done(&[0xAA, 0xBB], -80, 7))
//!     .unwrap();
//!
//! bridge.set_rx_buffer(vec![0; 16]);
//! let state = bridge.handle_event(HardwareEvent::Dio1).unwrap();
//!
//! assert_eq!(state, OperationState::RxDone);
//! assert_eq!(bridge.rx_metadata().len, 2);
//! assert_eq!(&bridge.rx_buffer().unwrap()[..2], &[0xAA, 0xBB]);
//! ```

use crate::buffer::RxSlot;
use crate::callbacks::{RadioEvents, RxMetadata};
use crate::dispatch::{LineTable, TimerTable};
use crate::driver::{IrqRegistrar, RadioDriver};
use crate::error::{DispatchError, InitError};
use crate::event::{HardwareEvent, OperationState, Route};
use crate::state::{StateCell, StateWatch};
use crate::stats::DispatchStats;
use log::{debug, error, info, warn};
use std::sync::Arc;

/// Per-radio dispatch context.
///
/// `B` is the receive buffer type, e.g. `&mut [u8]` for a borrowed region
/// or `Vec<u8>` for owned storage.
pub struct IrqBridge<B> {
    lines: LineTable,
    timers: TimerTable,
    state: Arc<StateCell>,
    metadata: RxMetadata,
    rx: RxSlot<B>,
    stats: DispatchStats,
}

impl<B> Default for IrqBridge<B> {
    fn default() -> Self {
        Self {
            lines: LineTable::new(),
            timers: TimerTable::new(),
            state: Arc::new(StateCell::new()),
            metadata: RxMetadata::default(),
            rx: RxSlot::new(),
            stats: DispatchStats::default(),
        }
    }
}

impl<B> IrqBridge<B> {
    /// Create a bridge with empty tables. Every line event fails until a
    /// driver registers its handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize `driver` and let it register its handlers, then put the
    /// radio to sleep.
    ///
    /// Any registered receive buffer and any previously installed handlers
    /// are dropped first. Handlers are installed only once the driver has
    /// initialized and gone to sleep; on failure every event is unconfigured.
    pub fn init<D: RadioDriver>(
        &mut self,
        driver: &mut D,
        board: D::Board,
    ) -> Result<(), InitError<D::Error>> {
        if self.rx.take().is_some() {
            debug!("rx buffer released on init");
        }
        self.lines = LineTable::new();
        self.timers = TimerTable::new();

        let mut lines = LineTable::new();
        let mut timers = TimerTable::new();
        let mut registrar = IrqRegistrar::new(&mut lines, &mut timers);
        driver.init(board, &mut registrar).map_err(|e| {
            error!("radio driver init failed, no handlers installed");
            InitError::Driver(e)
        })?;
        driver.sleep().map_err(|e| {
            error!("radio failed to enter sleep, no handlers installed");
            InitError::Driver(e)
        })?;

        if lines.is_empty() {
            warn!("radio driver registered no DIO handlers, line events will fail");
        }
        info!(
            "radio initialized: {} DIO handlers, {} timer handlers",
            lines.configured(),
            timers.configured()
        );
        self.lines = lines;
        self.timers = timers;
        Ok(())
    }

    /// Registration entry point outside of driver init.
    ///
    /// Intended for drivers that wire handlers lazily, and for tests.
    pub fn registrar(&mut self) -> IrqRegistrar<'_> {
        IrqRegistrar::new(&mut self.lines, &mut self.timers)
    }

    /// Returns true if `event` would reach a stored handler.
    pub fn is_configured(&self, event: HardwareEvent) -> bool {
        match event.route() {
            Route::Line(slot) => self.lines.is_set(slot),
            Route::Timer(timer) => self.timers.is_set(timer.index()),
        }
    }

    /// Register the destination for the next received frame.
    ///
    /// Returns the buffer that was registered before, if any.
    pub fn set_rx_buffer(&mut self, buf: B) -> Option<B> {
        self.rx.set(buf)
    }

    /// Revoke the receive buffer and hand it back.
    ///
    /// Later receive events update metadata only.
    pub fn take_rx_buffer(&mut self) -> Option<B> {
        self.rx.take()
    }

    /// Metadata of the last received frame.
    pub fn rx_metadata(&self) -> RxMetadata {
        self.metadata
    }

    /// Outcome of the last dispatch.
    pub fn state(&self) -> OperationState {
        self.state.load()
    }

    /// Read-only handle on the operation state for another context.
    pub fn watch(&self) -> StateWatch {
        StateWatch::new(self.state.clone())
    }

    /// Dispatch counters.
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Reset dispatch counters.
    pub fn reset_stats(&mut self) {
        self.stats = DispatchStats::default();
    }
}

impl<B> IrqBridge<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Read-only view of the registered receive buffer.
    pub fn rx_buffer(&self) -> Option<&[u8]> {
        self.rx.get()
    }

    /// Dispatch one hardware event and return the resulting state.
    ///
    /// Runs in the caller's context (interrupt handler or polling loop).
    /// If the same line fires twice before the result is read, only the
    /// latest outcome is kept.
    pub fn handle_event(&mut self, event: HardwareEvent) -> Result<OperationState, DispatchError> {
        self.state.store(OperationState::Busy);
        self.stats.dispatched += 1;

        let handler = match event.route() {
            Route::Line(slot) => match self.lines.get_mut(slot) {
                Some(handler) => handler,
                None => {
                    self.stats.unconfigured += 1;
                    error!("{} fired but slot {} has no handler", event, slot);
                    return Err(DispatchError::HandlerNotConfigured { event, slot });
                }
            },
            Route::Timer(timer) => match self.timers.get_mut(timer.index()) {
                Some(handler) => handler,
                None => {
                    self.stats.timer_ignored += 1;
                    self.stats.record_outcome(OperationState::Busy);
                    debug!("{} has no handler, ignored", event);
                    return Ok(OperationState::Busy);
                }
            },
        };

        let mut recorder = Recorder {
            state: &self.state,
            metadata: &mut self.metadata,
            rx: &mut self.rx,
            stats: &mut self.stats,
        };
        handler.on_irq(&mut recorder);

        let state = self.state.load();
        self.stats.record_outcome(state);
        debug!("{} -> {}", event, state);
        Ok(state)
    }
}

/// The bridge's outcome callbacks, alive for one dispatch.
struct Recorder<'a, B> {
    state: &'a StateCell,
    metadata: &'a mut RxMetadata,
    rx: &'a mut RxSlot<B>,
    stats: &'a mut DispatchStats,
}

impl<B> Recorder<'_, B> {
    /// Returns true once this dispatch has an outcome. Later reports are
    /// dropped.
    fn settled(&self, report: OperationState) -> bool {
        let current = self.state.load();
        if current.is_terminal() {
            warn!("handler reported {} after {}, keeping the first", report, current);
        }
        current.is_terminal()
    }

    fn finish(&mut self, state: OperationState) {
        if !self.settled(state) {
            self.state.store(state);
        }
    }
}

impl<B> RadioEvents for Recorder<'_, B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    fn on_tx_done(&mut self) {
        self.finish(OperationState::TxDone);
    }

    fn on_rx_done(&mut self, payload: &[u8], rssi: i16, snr: i8) {
        if self.settled(OperationState::RxDone) {
            return;
        }
        match self.rx.fill(payload) {
            Some(copy) if copy.truncated() => {
                self.stats.rx_truncated += 1;
                warn!(
                    "received {} bytes, rx buffer holds {}; frame truncated",
                    copy.received, copy.copied
                );
            }
            Some(_) => {}
            None => {
                self.stats.rx_unbuffered += 1;
                debug!("received {} bytes with no rx buffer registered", payload.len());
            }
        }
        *self.metadata = RxMetadata::new(payload.len(), rssi, snr);
        self.state.store(OperationState::RxDone);
    }

    fn on_tx_timeout(&mut self) {
        self.finish(OperationState::TxTimeout);
    }

    fn on_rx_timeout(&mut self) {
        self.finish(OperationState::RxTimeout);
    }

    fn on_rx_error(&mut self) {
        self.finish(OperationState::RxError);
    }
}
