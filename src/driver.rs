//! Radio driver seam.
//!
//! The bridge does not talk to the chip. A [`RadioDriver`] implementation
//! owns SPI, GPIO and timers; during [`RadioDriver::init`] it registers its
//! interrupt handlers through the [`IrqRegistrar`] it is given.
//! [`RadioControl`] adds the operations the [`Sx12xx`](crate::Sx12xx) facade
//! needs to configure and start transmissions.

use crate::config::{RxConfig, TxConfig};
use crate::dispatch::{BoxedHandler, IrqHandler, LineTable, Registration, TimerTable};
use crate::error::RegistrationError;
use crate::event::{TimerId, NUM_IRQ_HANDLES};
use log::{debug, warn};
use std::fmt;

/// Minimal driver surface the bridge needs.
pub trait RadioDriver {
    /// Driver error type.
    type Error: fmt::Debug;
    /// Board-specific bindings (pins, reset line, TCXO control).
    type Board;

    /// Bring up the chip and register interrupt handlers.
    fn init(&mut self, board: Self::Board, irq: &mut IrqRegistrar<'_>) -> Result<(), Self::Error>;

    /// Put the chip into its low-power idle state.
    fn sleep(&mut self) -> Result<(), Self::Error>;
}

/// Operations used by the radio facade.
pub trait RadioControl: RadioDriver {
    /// Tune to `frequency_hz`.
    fn set_channel(&mut self, frequency_hz: u32) -> Result<(), Self::Error>;

    /// Select the public (LoRaWAN) or private sync word.
    fn set_public_network(&mut self, enable: bool) -> Result<(), Self::Error>;

    /// Apply modem, power and modulation settings for the next transmission.
    fn set_tx_config(&mut self, config: &TxConfig) -> Result<(), Self::Error>;

    /// Apply modem and modulation settings for the next reception.
    fn set_rx_config(&mut self, config: &RxConfig) -> Result<(), Self::Error>;

    /// Start transmitting `payload`. Completion is reported by interrupt.
    fn send(&mut self, payload: &[u8]) -> Result<(), Self::Error>;

    /// Start receiving. A timeout of zero receives continuously.
    fn rx(&mut self, timeout_ms: u32) -> Result<(), Self::Error>;
}

/// Registration entry point handed to a driver during initialization.
pub struct IrqRegistrar<'a> {
    lines: &'a mut LineTable,
    timers: &'a mut TimerTable,
}

impl<'a> IrqRegistrar<'a> {
    pub(crate) fn new(lines: &'a mut LineTable, timers: &'a mut TimerTable) -> Self {
        Self { lines, timers }
    }

    /// Copy a full set of DIO handlers into the dispatch table by index.
    ///
    /// `None` entries clear their slot. Calling this again reconfigures the
    /// table; it is allowed but logged.
    pub fn register_dispatch_table(&mut self, handlers: [Option<BoxedHandler>; NUM_IRQ_HANDLES]) {
        if !self.lines.is_empty() {
            warn!("dispatch table registered again, overwriting existing handlers");
        }
        self.lines.load(handlers);
        debug!(
            "dispatch table loaded: {} of {} slots configured",
            self.lines.configured(),
            NUM_IRQ_HANDLES
        );
    }

    /// Store the handler for a single DIO slot.
    pub fn register_line<H>(
        &mut self,
        index: usize,
        handler: H,
    ) -> Result<Registration, RegistrationError>
    where
        H: IrqHandler + 'static,
    {
        let result = self.lines.insert(index, Box::new(handler))?;
        if result == Registration::Replaced {
            warn!("DIO slot {} handler replaced", index);
        }
        Ok(result)
    }

    /// Store the handler run when `timer` fires.
    pub fn register_timer<H>(
        &mut self,
        timer: TimerId,
        handler: H,
    ) -> Result<Registration, RegistrationError>
    where
        H: IrqHandler + 'static,
    {
        let result = self.timers.insert(timer.index(), Box::new(handler))?;
        if result == Registration::Replaced {
            warn!("{:?} handler replaced", timer);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::RadioEvents;

    #[test]
    fn test_register_line_reports_replacement() {
        let mut lines = LineTable::new();
        let mut timers = TimerTable::new();
        let mut reg = IrqRegistrar::new(&mut lines, &mut timers);

        let first = reg.register_line(2, |ev: &mut dyn RadioEvents| ev.on_rx_error());
        let second = reg.register_line(2, |ev: &mut dyn RadioEvents| ev.on_rx_timeout());
        assert_eq!(first, Ok(Registration::Registered));
        assert_eq!(second, Ok(Registration::Replaced));
    }

    #[test]
    fn test_register_line_out_of_range() {
        let mut lines = LineTable::new();
        let mut timers = TimerTable::new();
        let mut reg = IrqRegistrar::new(&mut lines, &mut timers);

        let result = reg.register_line(NUM_IRQ_HANDLES, |ev: &mut dyn RadioEvents| {
            ev.on_tx_done()
        });
        assert!(matches!(
            result,
            Err(RegistrationError::SlotOutOfRange { index: 6, len: 6 })
        ));
    }

    #[test]
    fn test_register_timer_lands_in_timer_table() {
        let mut lines = LineTable::new();
        let mut timers = TimerTable::new();
        {
            let mut reg = IrqRegistrar::new(&mut lines, &mut timers);
            let result =
                reg.register_timer(TimerId::Timer2, |ev: &mut dyn RadioEvents| ev.on_rx_timeout());
            assert_eq!(result, Ok(Registration::Registered));
        }
        assert!(lines.is_empty());
        assert!(timers.is_set(TimerId::Timer2.index()));
    }

    #[test]
    fn test_register_dispatch_table_copies_by_index() {
        let mut lines = LineTable::new();
        let mut timers = TimerTable::new();
        let mut reg = IrqRegistrar::new(&mut lines, &mut timers);

        let mut handlers: [Option<BoxedHandler>; NUM_IRQ_HANDLES] = Default::default();
        handlers[0] = Some(Box::new(|ev: &mut dyn RadioEvents| ev.on_tx_done()));
        handlers[5] = Some(Box::new(|ev: &mut dyn RadioEvents| ev.on_rx_error()));
        reg.register_dispatch_table(handlers);

        assert!(lines.is_set(0));
        assert!(!lines.is_set(1));
        assert!(lines.is_set(5));
        assert_eq!(lines.configured(), 2);
    }
}
