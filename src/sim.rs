//! Host-side simulated radio driver.
//!
//! [`SimRadio`] behaves like an SX126x driver from the bridge's point of
//! view: during init it registers a single DIO handler on slot 0 that reads
//! the pending interrupt cause and reports it, and optionally stashes its
//! tx/rx timeout timers on `Timer1`/`Timer2`. Tests and the `sim-radio`
//! binary queue interrupt causes through a [`SimController`].
//!
//! # Example
//!
//! ```
//! use sx12xx_irq::sim::{SimBoard, SimIrq, SimRadio};
//! use sx12xx_irq::{HardwareEvent, IrqBridge, OperationState};
//!
//! let mut radio = SimRadio::new();
//! let ctl = radio.controller();
//! let mut bridge: IrqBridge<Vec<u8>> = IrqBridge::new();
//! bridge.init(&mut radio, SimBoard::default()).unwrap();
//!
//! ctl.raise(SimIrq::TxDone);
//! assert_eq!(bridge.handle_event(HardwareEvent::Dio1), Ok(OperationState::TxDone));
//! ```

use crate::callbacks::RadioEvents;
use crate::config::{RxConfig, TxConfig, MAX_PAYLOAD_LEN};
use crate::driver::{IrqRegistrar, RadioControl, RadioDriver};
use crate::event::TimerId;
use log::{debug, info};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Interrupt cause latched in the simulated chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimIrq {
    TxDone,
    RxDone { payload: Vec<u8>, rssi: i16, snr: i8 },
    /// RX/TX timeout IRQ; reported according to the current mode.
    Timeout,
    CrcError,
    HeaderError,
}

/// Operating mode of the simulated chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimMode {
    #[default]
    Sleep,
    Standby,
    Tx,
    Rx,
}

/// Board bindings for the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimBoard {
    /// Stash the tx/rx timeout timers on `Timer1`/`Timer2`.
    pub timers: bool,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self { timers: true }
    }
}

/// Observable state of the simulated chip.
#[derive(Debug, Default)]
pub struct SimChip {
    pub mode: SimMode,
    pub pending: VecDeque<SimIrq>,
    pub frequency_hz: u32,
    pub public_network: bool,
    pub tx_config: Option<TxConfig>,
    pub rx_config: Option<RxConfig>,
    /// Frames handed to `send`, oldest first.
    pub sent: Vec<Vec<u8>>,
    /// Timeout passed to the last `rx` call.
    pub rx_timeout_ms: Option<u32>,
    pub inits: u32,
    pub sleeps: u32,
}

/// Errors from the simulated driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Chip did not answer during init.
    NoResponse,
    PayloadTooLarge { size: usize, max: usize },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse => write!(f, "radio did not respond"),
            Self::PayloadTooLarge { size, max } => {
                write!(f, "payload too large: {} bytes (max {})", size, max)
            }
        }
    }
}

impl std::error::Error for SimError {}

fn lock(chip: &Mutex<SimChip>) -> MutexGuard<'_, SimChip> {
    chip.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated radio driver.
#[derive(Debug, Default)]
pub struct SimRadio {
    chip: Arc<Mutex<SimChip>>,
    fail_init: bool,
}

impl SimRadio {
    /// Simulated radio in sleep mode with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// A radio whose init always fails.
    pub fn unresponsive() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    /// Handle for raising interrupts and inspecting the chip.
    pub fn controller(&self) -> SimController {
        SimController {
            chip: self.chip.clone(),
        }
    }
}

impl RadioDriver for SimRadio {
    type Error = SimError;
    type Board = SimBoard;

    fn init(&mut self, board: SimBoard, irq: &mut IrqRegistrar<'_>) -> Result<(), SimError> {
        if self.fail_init {
            return Err(SimError::NoResponse);
        }
        {
            let mut chip = lock(&self.chip);
            chip.inits += 1;
            chip.mode = SimMode::Standby;
        }

        // One handler services every DIO condition
        let chip = self.chip.clone();
        // Slot 0 is always in range
        let _ = irq.register_line(0, move |events: &mut dyn RadioEvents| {
            service_dio(&chip, events)
        });

        if board.timers {
            let chip = self.chip.clone();
            let _ = irq.register_timer(TimerId::Timer1, move |events: &mut dyn RadioEvents| {
                lock(&chip).mode = SimMode::Standby;
                events.on_tx_timeout();
            });
            let chip = self.chip.clone();
            let _ = irq.register_timer(TimerId::Timer2, move |events: &mut dyn RadioEvents| {
                lock(&chip).mode = SimMode::Standby;
                events.on_rx_timeout();
            });
        }

        info!("simulated radio up (timers: {})", board.timers);
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), SimError> {
        let mut chip = lock(&self.chip);
        chip.mode = SimMode::Sleep;
        chip.sleeps += 1;
        Ok(())
    }
}

impl RadioControl for SimRadio {
    fn set_channel(&mut self, frequency_hz: u32) -> Result<(), SimError> {
        lock(&self.chip).frequency_hz = frequency_hz;
        Ok(())
    }

    fn set_public_network(&mut self, enable: bool) -> Result<(), SimError> {
        lock(&self.chip).public_network = enable;
        Ok(())
    }

    fn set_tx_config(&mut self, config: &TxConfig) -> Result<(), SimError> {
        lock(&self.chip).tx_config = Some(*config);
        Ok(())
    }

    fn set_rx_config(&mut self, config: &RxConfig) -> Result<(), SimError> {
        lock(&self.chip).rx_config = Some(*config);
        Ok(())
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), SimError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(SimError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }
        let mut chip = lock(&self.chip);
        chip.sent.push(payload.to_vec());
        chip.mode = SimMode::Tx;
        Ok(())
    }

    fn rx(&mut self, timeout_ms: u32) -> Result<(), SimError> {
        let mut chip = lock(&self.chip);
        chip.rx_timeout_ms = Some(timeout_ms);
        chip.mode = SimMode::Rx;
        Ok(())
    }
}

/// Decode the latched IRQ and report it, the way an SX126x driver's IRQ
/// process routine does.
fn service_dio(chip: &Mutex<SimChip>, events: &mut dyn RadioEvents) {
    let (irq, mode, continuous) = {
        let mut chip = lock(chip);
        let continuous = chip.rx_config.map(|c| c.continuous).unwrap_or(false);
        (chip.pending.pop_front(), chip.mode, continuous)
    };

    let Some(irq) = irq else {
        debug!("spurious DIO interrupt");
        return;
    };

    let next_mode = match (&irq, mode) {
        (SimIrq::RxDone { .. }, SimMode::Rx) if continuous => SimMode::Rx,
        _ => SimMode::Standby,
    };
    lock(chip).mode = next_mode;

    match irq {
        SimIrq::TxDone => events.on_tx_done(),
        SimIrq::RxDone { payload, rssi, snr } => events.on_rx_done(&payload, rssi, snr),
        SimIrq::Timeout if mode == SimMode::Tx => events.on_tx_timeout(),
        SimIrq::Timeout => events.on_rx_timeout(),
        SimIrq::CrcError | SimIrq::HeaderError => events.on_rx_error(),
    }
}

/// Cloneable handle on a [`SimRadio`]'s chip.
#[derive(Debug, Clone)]
pub struct SimController {
    chip: Arc<Mutex<SimChip>>,
}

impl SimController {
    /// Latch an interrupt cause; the next DIO dispatch reports it.
    pub fn raise(&self, irq: SimIrq) {
        lock(&self.chip).pending.push_back(irq);
    }

    /// Inspect the chip.
    pub fn with_chip<R>(&self, f: impl FnOnce(&SimChip) -> R) -> R {
        f(&lock(&self.chip))
    }

    /// Current chip mode.
    pub fn mode(&self) -> SimMode {
        self.with_chip(|chip| chip.mode)
    }

    /// Frames sent so far.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.with_chip(|chip| chip.sent.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::IrqBridge;
    use crate::error::InitError;
    use crate::event::{HardwareEvent, OperationState};

    fn setup(board: SimBoard) -> (SimRadio, SimController, IrqBridge<Vec<u8>>) {
        let mut radio = SimRadio::new();
        let ctl = radio.controller();
        let mut bridge = IrqBridge::new();
        bridge.init(&mut radio, board).unwrap();
        (radio, ctl, bridge)
    }

    #[test]
    fn test_init_registers_and_sleeps() {
        let (_radio, ctl, bridge) = setup(SimBoard::default());
        assert!(bridge.is_configured(HardwareEvent::Dio0));
        assert!(bridge.is_configured(HardwareEvent::Dio1));
        assert!(!bridge.is_configured(HardwareEvent::Dio2));
        assert!(bridge.is_configured(HardwareEvent::Timer1));
        assert!(bridge.is_configured(HardwareEvent::Timer2));
        assert!(!bridge.is_configured(HardwareEvent::Timer3));
        assert_eq!(ctl.mode(), SimMode::Sleep);
        assert_eq!(ctl.with_chip(|c| (c.inits, c.sleeps)), (1, 1));
    }

    #[test]
    fn test_init_without_timers() {
        let (_radio, _ctl, mut bridge) = setup(SimBoard { timers: false });
        assert_eq!(bridge.handle_event(HardwareEvent::Timer1), Ok(OperationState::Busy));
    }

    #[test]
    fn test_init_failure_is_reported() {
        let mut radio = SimRadio::unresponsive();
        let ctl = radio.controller();
        let mut bridge: IrqBridge<Vec<u8>> = IrqBridge::new();
        let result = bridge.init(&mut radio, SimBoard::default());
        assert!(matches!(result, Err(InitError::Driver(SimError::NoResponse))));
        assert_eq!(ctl.with_chip(|c| c.sleeps), 0);
        assert!(!bridge.is_configured(HardwareEvent::Dio0));
    }

    #[test]
    fn test_init_releases_rx_buffer() {
        let mut radio = SimRadio::new();
        let mut bridge: IrqBridge<Vec<u8>> = IrqBridge::new();
        bridge.set_rx_buffer(vec![0; 4]);
        bridge.init(&mut radio, SimBoard::default()).unwrap();
        assert!(bridge.rx_buffer().is_none());
    }

    #[test]
    fn test_timeout_follows_mode() {
        let (mut radio, ctl, mut bridge) = setup(SimBoard::default());

        radio.send(&[1, 2]).unwrap();
        ctl.raise(SimIrq::Timeout);
        assert_eq!(bridge.handle_event(HardwareEvent::Dio0), Ok(OperationState::TxTimeout));

        radio.rx(1000).unwrap();
        ctl.raise(SimIrq::Timeout);
        assert_eq!(bridge.handle_event(HardwareEvent::Dio0), Ok(OperationState::RxTimeout));
        assert_eq!(ctl.mode(), SimMode::Standby);
    }

    #[test]
    fn test_rx_done_copies_payload() {
        let (mut radio, ctl, mut bridge) = setup(SimBoard::default());
        bridge.set_rx_buffer(vec![0; 4]);
        radio.rx(0).unwrap();

        ctl.raise(SimIrq::RxDone {
            payload: vec![1, 2, 3, 4, 5],
            rssi: -80,
            snr: 7,
        });
        assert_eq!(bridge.handle_event(HardwareEvent::Dio1), Ok(OperationState::RxDone));
        assert_eq!(bridge.rx_buffer(), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(bridge.rx_metadata().len, 5);
    }

    #[test]
    fn test_crc_and_header_errors() {
        let (_radio, ctl, mut bridge) = setup(SimBoard::default());
        ctl.raise(SimIrq::CrcError);
        ctl.raise(SimIrq::HeaderError);
        assert_eq!(bridge.handle_event(HardwareEvent::Dio0), Ok(OperationState::RxError));
        assert_eq!(bridge.handle_event(HardwareEvent::Dio0), Ok(OperationState::RxError));
    }

    #[test]
    fn test_spurious_interrupt_stays_busy() {
        let (_radio, _ctl, mut bridge) = setup(SimBoard::default());
        assert_eq!(bridge.handle_event(HardwareEvent::Dio0), Ok(OperationState::Busy));
    }

    #[test]
    fn test_timer_handlers() {
        let (mut radio, ctl, mut bridge) = setup(SimBoard::default());
        radio.rx(500).unwrap();
        assert_eq!(bridge.handle_event(HardwareEvent::Timer2), Ok(OperationState::RxTimeout));
        assert_eq!(ctl.mode(), SimMode::Standby);
        assert_eq!(bridge.handle_event(HardwareEvent::Timer1), Ok(OperationState::TxTimeout));
        assert_eq!(bridge.handle_event(HardwareEvent::Timer3), Ok(OperationState::Busy));
    }

    #[test]
    fn test_send_rejects_oversized_payload() {
        let mut radio = SimRadio::new();
        let result = radio.send(&[0u8; MAX_PAYLOAD_LEN + 1]);
        assert_eq!(
            result,
            Err(SimError::PayloadTooLarge {
                size: 256,
                max: 255
            })
        );
    }
}
