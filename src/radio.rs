//! Radio facade.
//!
//! [`Sx12xx`] owns a driver, an [`IrqBridge`] and a frame buffer. It turns
//! modem settings into driver configuration, starts transmissions and
//! receptions, and maps dispatch outcomes into [`Response`]s that carry the
//! link quality of received frames.
//!
//! # Example
//!
//! ```
//! use sx12xx_irq::config::{LoRaBandwidth, LoRaCodingRate, LoRaSpreadingFactor, RadioSettings};
//! use sx12xx_irq::sim::{SimBoard, SimIrq, SimRadio};
//! use sx12xx_irq::{HardwareEvent, Response, Sx12xx};
//!
//! let radio = SimRadio::new();
//! let ctl = radio.controller();
//! let mut sx = Sx12xx::new(radio, SimBoard::default(), RadioSettings::default()).unwrap();
//!
//! sx.set_frequency(868_100_000).unwrap();
//! sx.configure_lora_tx(14, LoRaBandwidth::Khz125, LoRaSpreadingFactor::Sf7, LoRaCodingRate::Cr4_5)
//!     .unwrap();
//! sx.send(b"ping").unwrap();
//!
//! ctl.raise(SimIrq::TxDone);
//! assert_eq!(sx.handle_event(HardwareEvent::Dio0).unwrap(), Response::TxDone);
//! ```

use crate::bridge::IrqBridge;
use crate::callbacks::RxMetadata;
use crate::config::{
    ConfigError, HopPeriod, LoRaBandwidth, LoRaCodingRate, LoRaSpreadingFactor, RadioSettings,
    MAX_PAYLOAD_LEN,
};
use crate::driver::RadioControl;
use crate::error::{DispatchError, InitError};
use crate::event::{HardwareEvent, OperationState};
use crate::state::StateWatch;
use crate::stats::DispatchStats;
use log::{debug, info};
use std::fmt;

/// Link quality of a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxQuality {
    rssi: i16,
    snr: i8,
}

impl RxQuality {
    /// Quality figures of one received frame.
    pub fn new(rssi: i16, snr: i8) -> Self {
        Self { rssi, snr }
    }

    /// Received signal strength in dBm.
    pub fn rssi(&self) -> i16 {
        self.rssi
    }

    /// Signal-to-noise ratio in dB.
    pub fn snr(&self) -> i8 {
        self.snr
    }
}

/// Outcome of a dispatched event, as seen by the facade's user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Busy,
    TxDone,
    RxDone(RxQuality),
    TxTimeout,
    RxTimeout,
    RxError,
}

/// Errors from the radio facade.
#[derive(Debug)]
pub enum RadioError<E> {
    /// Driver call failed.
    Driver(E),
    /// Event dispatch failed.
    Dispatch(DispatchError),
    /// Settings rejected.
    Config(ConfigError),
    /// Frame does not fit the radio FIFO.
    PayloadTooLarge { size: usize, max: usize },
}

impl<E: fmt::Debug> fmt::Display for RadioError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver(e) => write!(f, "radio driver error: {:?}", e),
            Self::Dispatch(e) => write!(f, "dispatch error: {}", e),
            Self::Config(e) => write!(f, "{}", e),
            Self::PayloadTooLarge { size, max } => {
                write!(f, "payload too large: {} bytes (max {})", size, max)
            }
        }
    }
}

impl<E: fmt::Debug> std::error::Error for RadioError<E> {}

impl<E> From<DispatchError> for RadioError<E> {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

impl<E> From<ConfigError> for RadioError<E> {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl<E> From<InitError<E>> for RadioError<E> {
    fn from(e: InitError<E>) -> Self {
        match e {
            InitError::Driver(e) => Self::Driver(e),
        }
    }
}

/// A radio driven through the interrupt bridge.
pub struct Sx12xx<D: RadioControl> {
    driver: D,
    bridge: IrqBridge<Vec<u8>>,
    settings: RadioSettings,
    /// Outgoing frame, or the last received frame.
    buffer: Vec<u8>,
}

impl<D: RadioControl> Sx12xx<D> {
    /// Validate `settings`, initialize the driver and leave it asleep.
    pub fn new(
        mut driver: D,
        board: D::Board,
        settings: RadioSettings,
    ) -> Result<Self, RadioError<D::Error>> {
        settings.validate()?;
        let mut bridge = IrqBridge::new();
        bridge.init(&mut driver, board)?;
        Ok(Self {
            driver,
            bridge,
            settings,
            buffer: Vec::with_capacity(MAX_PAYLOAD_LEN),
        })
    }

    /// Dispatch `event` and report the outcome.
    ///
    /// On `TxDone` the frame buffer is cleared. On `RxDone` it holds the
    /// received bytes, truncated to the receive buffer.
    pub fn handle_event(&mut self, event: HardwareEvent) -> Result<Response, RadioError<D::Error>> {
        let response = match self.bridge.handle_event(event)? {
            OperationState::Busy => Response::Busy,
            OperationState::TxDone => {
                self.buffer.clear();
                Response::TxDone
            }
            OperationState::RxDone => {
                let meta = self.bridge.rx_metadata();
                self.buffer.clear();
                if let Some(rx) = self.bridge.rx_buffer() {
                    let len = usize::from(meta.len).min(rx.len());
                    self.buffer.extend_from_slice(&rx[..len]);
                }
                Response::RxDone(RxQuality::new(meta.rssi, meta.snr))
            }
            OperationState::TxTimeout => Response::TxTimeout,
            OperationState::RxTimeout => Response::RxTimeout,
            OperationState::RxError => Response::RxError,
        };
        Ok(response)
    }

    /// Copy `payload` into the frame buffer and transmit it.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), RadioError<D::Error>> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(RadioError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }
        self.buffer.clear();
        self.buffer.extend_from_slice(payload);
        self.send_buffer()
    }

    /// Transmit the current contents of the frame buffer.
    pub fn send_buffer(&mut self) -> Result<(), RadioError<D::Error>> {
        if self.buffer.len() > MAX_PAYLOAD_LEN {
            return Err(RadioError::PayloadTooLarge {
                size: self.buffer.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }
        debug!("sending {} bytes", self.buffer.len());
        self.driver.send(&self.buffer).map_err(RadioError::Driver)
    }

    /// Register a full-size receive buffer and start receiving.
    pub fn set_rx(&mut self) -> Result<(), RadioError<D::Error>> {
        if self.bridge.rx_buffer().map(<[u8]>::len) != Some(MAX_PAYLOAD_LEN) {
            self.bridge.set_rx_buffer(vec![0; MAX_PAYLOAD_LEN]);
        }
        self.driver.rx(0).map_err(RadioError::Driver)
    }

    /// Stop copying received frames.
    pub fn release_rx(&mut self) {
        self.bridge.take_rx_buffer();
    }

    /// Configure a LoRa transmission with the current settings.
    ///
    /// `power` is in dBm.
    pub fn configure_lora_tx(
        &mut self,
        power: i8,
        bandwidth: LoRaBandwidth,
        datarate: LoRaSpreadingFactor,
        coderate: LoRaCodingRate,
    ) -> Result<(), RadioError<D::Error>> {
        let config = self.settings.lora_tx(power, bandwidth, datarate, coderate);
        info!(
            "LoRa tx: {} dBm, {} Hz, SF{}, CR 4/{}",
            power,
            bandwidth.hz(),
            config.datarate,
            config.coderate + 4
        );
        self.driver.set_tx_config(&config).map_err(RadioError::Driver)
    }

    /// Configure LoRa reception with the current settings.
    pub fn configure_lora_rx(
        &mut self,
        bandwidth: LoRaBandwidth,
        datarate: LoRaSpreadingFactor,
        coderate: LoRaCodingRate,
    ) -> Result<(), RadioError<D::Error>> {
        let config = self.settings.lora_rx(bandwidth, datarate, coderate);
        self.driver.set_rx_config(&config).map_err(RadioError::Driver)
    }

    /// Configure an FSK transmission. `fdev` is the frequency deviation
    /// and `datarate` the bit rate, both in Hz.
    pub fn configure_fsk_tx(
        &mut self,
        power: i8,
        fdev: u32,
        datarate: u32,
    ) -> Result<(), RadioError<D::Error>> {
        let config = self.settings.fsk_tx(power, fdev, datarate);
        self.driver.set_tx_config(&config).map_err(RadioError::Driver)
    }

    /// Tune the radio to `frequency_hz`.
    pub fn set_frequency(&mut self, frequency_hz: u32) -> Result<(), RadioError<D::Error>> {
        self.driver.set_channel(frequency_hz).map_err(RadioError::Driver)
    }

    /// Use the public (LoRaWAN) sync word when `enable` is true.
    pub fn set_public_network(&mut self, enable: bool) -> Result<(), RadioError<D::Error>> {
        self.driver.set_public_network(enable).map_err(RadioError::Driver)
    }

    /// Hop frequency every `period` symbols from the next configuration on.
    pub fn enable_hop_period(&mut self, period: u8) {
        self.settings.hop_period = HopPeriod::Enabled(period);
    }

    /// Stop frequency hopping from the next configuration on.
    pub fn disable_hop_period(&mut self) {
        self.settings.hop_period = HopPeriod::Disabled;
    }

    /// Invert I/Q on transmit from the next configuration on.
    pub fn set_iq_invert_tx(&mut self, invert: bool) {
        self.settings.iq_inverted.tx = invert;
    }

    /// Invert I/Q on receive from the next configuration on.
    pub fn set_iq_invert_rx(&mut self, invert: bool) {
        self.settings.iq_inverted.rx = invert;
    }

    /// Receive timeout in LoRa symbols (bytes for FSK).
    pub fn set_timeout(&mut self, symbols: u16) {
        self.settings.symbol_timeout = symbols;
    }

    /// Settings applied by the next configuration call.
    pub fn settings(&self) -> &RadioSettings {
        &self.settings
    }

    /// Outgoing frame, or the last received frame.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Frame buffer for [`send_buffer`](Self::send_buffer).
    pub fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buffer
    }

    /// Metadata of the last received frame.
    pub fn rx_metadata(&self) -> RxMetadata {
        self.bridge.rx_metadata()
    }

    /// Read-only handle on the operation state.
    pub fn watch(&self) -> StateWatch {
        self.bridge.watch()
    }

    /// Dispatch counters.
    pub fn stats(&self) -> &DispatchStats {
        self.bridge.stats()
    }

    /// The underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Modem;
    use crate::sim::{SimBoard, SimController, SimError, SimIrq, SimMode, SimRadio};

    fn setup() -> (Sx12xx<SimRadio>, SimController) {
        let radio = SimRadio::new();
        let ctl = radio.controller();
        let sx = Sx12xx::new(radio, SimBoard::default(), RadioSettings::default()).unwrap();
        (sx, ctl)
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        let settings = RadioSettings {
            preamble_len: 2,
            ..Default::default()
        };
        let result = Sx12xx::new(SimRadio::new(), SimBoard::default(), settings);
        assert!(matches!(result, Err(RadioError::Config(_))));
    }

    #[test]
    fn test_new_reports_driver_failure() {
        let result = Sx12xx::new(
            SimRadio::unresponsive(),
            SimBoard::default(),
            RadioSettings::default(),
        );
        assert!(matches!(result, Err(RadioError::Driver(SimError::NoResponse))));
    }

    #[test]
    fn test_send_then_tx_done_clears_buffer() {
        let (mut sx, ctl) = setup();
        sx.send(&[0xCA, 0xFE]).unwrap();
        assert_eq!(sx.buffer(), &[0xCA, 0xFE]);
        assert_eq!(ctl.sent(), vec![vec![0xCA, 0xFE]]);
        assert_eq!(ctl.mode(), SimMode::Tx);

        ctl.raise(SimIrq::TxDone);
        assert_eq!(sx.handle_event(HardwareEvent::Dio0).unwrap(), Response::TxDone);
        assert!(sx.buffer().is_empty());
    }

    #[test]
    fn test_send_rejects_oversized_frame() {
        let (mut sx, ctl) = setup();
        let result = sx.send(&[0u8; 300]);
        assert!(matches!(
            result,
            Err(RadioError::PayloadTooLarge { size: 300, max: 255 })
        ));
        assert!(ctl.sent().is_empty());
    }

    #[test]
    fn test_send_buffer_after_editing() {
        let (mut sx, ctl) = setup();
        sx.buffer_mut().extend_from_slice(b"abc");
        sx.send_buffer().unwrap();
        assert_eq!(ctl.sent(), vec![b"abc".to_vec()]);
    }

    #[test]
    fn test_receive_copies_frame_and_quality() {
        let (mut sx, ctl) = setup();
        sx.configure_lora_rx(
            LoRaBandwidth::Khz125,
            LoRaSpreadingFactor::Sf9,
            LoRaCodingRate::Cr4_5,
        )
        .unwrap();
        sx.set_rx().unwrap();
        assert_eq!(ctl.with_chip(|c| c.rx_timeout_ms), Some(0));

        ctl.raise(SimIrq::RxDone {
            payload: vec![9, 8, 7],
            rssi: -97,
            snr: -4,
        });
        let response = sx.handle_event(HardwareEvent::Dio1).unwrap();
        assert_eq!(response, Response::RxDone(RxQuality::new(-97, -4)));
        assert_eq!(sx.buffer(), &[9, 8, 7]);
        assert_eq!(sx.rx_metadata().len, 3);
        // Continuous receive keeps the chip listening
        assert_eq!(ctl.mode(), SimMode::Rx);
    }

    #[test]
    fn test_receive_after_release_has_no_bytes() {
        let (mut sx, ctl) = setup();
        sx.set_rx().unwrap();
        sx.release_rx();

        ctl.raise(SimIrq::RxDone {
            payload: vec![1, 2],
            rssi: -60,
            snr: 10,
        });
        let response = sx.handle_event(HardwareEvent::Dio0).unwrap();
        assert!(matches!(response, Response::RxDone(q) if q.rssi() == -60 && q.snr() == 10));
        assert!(sx.buffer().is_empty());
        assert_eq!(sx.stats().rx_unbuffered, 1);
    }

    #[test]
    fn test_timeouts_and_errors() {
        let (mut sx, ctl) = setup();
        sx.set_rx().unwrap();
        ctl.raise(SimIrq::Timeout);
        assert_eq!(sx.handle_event(HardwareEvent::Dio0).unwrap(), Response::RxTimeout);

        ctl.raise(SimIrq::CrcError);
        assert_eq!(sx.handle_event(HardwareEvent::Dio0).unwrap(), Response::RxError);

        assert_eq!(sx.handle_event(HardwareEvent::Timer1).unwrap(), Response::TxTimeout);
        assert_eq!(sx.handle_event(HardwareEvent::Timer3).unwrap(), Response::Busy);
    }

    #[test]
    fn test_unconfigured_line_is_dispatch_error() {
        let (mut sx, _ctl) = setup();
        let result = sx.handle_event(HardwareEvent::Dio4);
        assert!(matches!(
            result,
            Err(RadioError::Dispatch(DispatchError::HandlerNotConfigured { slot: 4, .. }))
        ));
    }

    #[test]
    fn test_configuration_reaches_driver() {
        let (mut sx, ctl) = setup();
        sx.set_frequency(915_000_000).unwrap();
        sx.set_public_network(true).unwrap();
        sx.enable_hop_period(3);
        sx.set_iq_invert_tx(true);
        sx.configure_lora_tx(
            20,
            LoRaBandwidth::Khz250,
            LoRaSpreadingFactor::Sf12,
            LoRaCodingRate::Cr4_6,
        )
        .unwrap();

        let tx = ctl.with_chip(|c| c.tx_config).unwrap();
        assert_eq!(tx.modem, Modem::LoRa);
        assert_eq!(tx.power, 20);
        assert_eq!(tx.bandwidth, 1);
        assert_eq!(tx.datarate, 12);
        assert_eq!(tx.coderate, 2);
        assert!(tx.freq_hop_on);
        assert_eq!(tx.hop_period, 3);
        assert!(tx.iq_inverted);
        assert_eq!(ctl.with_chip(|c| (c.frequency_hz, c.public_network)), (915_000_000, true));
    }

    #[test]
    fn test_settings_mutators() {
        let (mut sx, ctl) = setup();
        sx.enable_hop_period(8);
        sx.disable_hop_period();
        sx.set_iq_invert_rx(false);
        sx.set_timeout(12);
        assert_eq!(sx.settings().hop_period, HopPeriod::Disabled);

        sx.configure_lora_rx(
            LoRaBandwidth::Khz125,
            LoRaSpreadingFactor::Sf7,
            LoRaCodingRate::Cr4_5,
        )
        .unwrap();
        let rx = ctl.with_chip(|c| c.rx_config).unwrap();
        assert!(!rx.iq_inverted);
        assert_eq!(rx.symbol_timeout, 12);
        assert!(!rx.freq_hop_on);
    }

    #[test]
    fn test_fsk_tx_configuration() {
        let (mut sx, ctl) = setup();
        sx.configure_fsk_tx(5, 25_000, 50_000).unwrap();
        let tx = ctl.with_chip(|c| c.tx_config).unwrap();
        assert_eq!(tx.modem, Modem::Fsk);
        assert_eq!(tx.fdev, 25_000);
    }

    #[test]
    fn test_watch_tracks_last_response() {
        let (mut sx, ctl) = setup();
        let watch = sx.watch();
        ctl.raise(SimIrq::TxDone);
        sx.handle_event(HardwareEvent::Dio0).unwrap();
        assert_eq!(watch.get(), OperationState::TxDone);
        assert_eq!(sx.driver().controller().mode(), SimMode::Standby);
    }
}
