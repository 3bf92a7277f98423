//! Radio modem configuration.
//!
//! [`RadioSettings`] holds the parameters that stay fixed between
//! transmissions (preamble, CRC, IQ inversion, hopping). The modulation
//! parameters chosen per operation are combined with them into a
//! [`TxConfig`] or [`RxConfig`] and handed to the driver.
//!
//! # Example
//!
//! ```
//! use sx12xx_irq::config::{LoRaBandwidth, LoRaCodingRate, LoRaSpreadingFactor, RadioSettings};
//!
//! let settings = RadioSettings::default();
//! assert!(settings.validate().is_ok());
//!
//! let tx = settings.lora_tx(14, LoRaBandwidth::Khz125, LoRaSpreadingFactor::Sf10, LoRaCodingRate::Cr4_5);
//! assert_eq!(tx.datarate, 10);
//! assert!(tx.crc_on);
//! ```

use std::fmt;

/// Largest frame the radio FIFO accepts.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Transmit timeout handed to the driver (ms).
pub const TX_TIMEOUT_MS: u32 = 3000;

/// Modem selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modem {
    Fsk,
    LoRa,
}

/// LoRa bandwidth, encoded the way Semtech drivers expect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoRaBandwidth {
    Khz125 = 0,
    Khz250 = 1,
    Khz500 = 2,
}

impl LoRaBandwidth {
    /// Bandwidth in Hz.
    pub fn hz(self) -> u32 {
        match self {
            Self::Khz125 => 125_000,
            Self::Khz250 => 250_000,
            Self::Khz500 => 500_000,
        }
    }
}

/// LoRa spreading factor (SF7..SF12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoRaSpreadingFactor {
    Sf7 = 7,
    Sf8 = 8,
    Sf9 = 9,
    Sf10 = 10,
    Sf11 = 11,
    Sf12 = 12,
}

/// LoRa coding rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoRaCodingRate {
    Cr4_5 = 1,
    Cr4_6 = 2,
    Cr4_7 = 3,
    Cr4_8 = 4,
}

/// Frequency hopping setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HopPeriod {
    #[default]
    Disabled,
    /// Hop every `n` symbols.
    Enabled(u8),
}

impl HopPeriod {
    /// `(freq_hop_on, hop_period)` as drivers take them.
    pub fn as_driver_params(self) -> (bool, u8) {
        match self {
            Self::Disabled => (false, 0),
            Self::Enabled(period) => (true, period),
        }
    }
}

/// IQ inversion per direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IqInverted {
    pub tx: bool,
    pub rx: bool,
}

/// Parameters shared by every transmission and reception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioSettings {
    pub iq_inverted: IqInverted,
    pub hop_period: HopPeriod,
    pub crc_on: bool,
    /// Fixed-length (implicit header) frames.
    pub fix_len: bool,
    /// Preamble length in symbols.
    pub preamble_len: u16,
    /// Receive symbol timeout (LoRa symbols, or bytes for FSK).
    pub symbol_timeout: u16,
    /// Keep receiving after each frame.
    pub continuous_rx: bool,
    /// Transmit timeout in milliseconds.
    pub tx_timeout_ms: u32,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            iq_inverted: IqInverted {
                tx: false,
                rx: true,
            },
            hop_period: HopPeriod::Disabled,
            crc_on: true,
            fix_len: false,
            preamble_len: 8,
            symbol_timeout: 5,
            continuous_rx: true,
            tx_timeout_ms: TX_TIMEOUT_MS,
        }
    }
}

impl RadioSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preamble_len < 6 {
            return Err(ConfigError::InvalidConfig("preamble_len must be >= 6"));
        }
        if self.symbol_timeout == 0 && !self.continuous_rx {
            return Err(ConfigError::InvalidConfig(
                "symbol_timeout must be > 0 for single receive",
            ));
        }
        if self.tx_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig("tx_timeout_ms must be > 0"));
        }
        if self.hop_period == HopPeriod::Enabled(0) {
            return Err(ConfigError::InvalidConfig("hop period must be > 0 symbols"));
        }
        Ok(())
    }

    /// Build a LoRa transmit configuration.
    pub fn lora_tx(
        &self,
        power: i8,
        bandwidth: LoRaBandwidth,
        datarate: LoRaSpreadingFactor,
        coderate: LoRaCodingRate,
    ) -> TxConfig {
        let (freq_hop_on, hop_period) = self.hop_period.as_driver_params();
        TxConfig {
            modem: Modem::LoRa,
            power,
            // Frequency deviation is FSK only
            fdev: 0,
            bandwidth: bandwidth as u32,
            datarate: datarate as u32,
            coderate: coderate as u8,
            preamble_len: self.preamble_len,
            fix_len: self.fix_len,
            crc_on: self.crc_on,
            freq_hop_on,
            hop_period,
            iq_inverted: self.iq_inverted.tx,
            timeout_ms: self.tx_timeout_ms,
        }
    }

    /// Build an FSK transmit configuration.
    pub fn fsk_tx(&self, power: i8, fdev: u32, datarate: u32) -> TxConfig {
        TxConfig {
            modem: Modem::Fsk,
            power,
            fdev,
            bandwidth: 0,
            datarate,
            coderate: 0,
            preamble_len: self.preamble_len,
            fix_len: self.fix_len,
            crc_on: self.crc_on,
            freq_hop_on: false,
            hop_period: 0,
            iq_inverted: false,
            timeout_ms: 0,
        }
    }

    /// Build a LoRa receive configuration.
    pub fn lora_rx(
        &self,
        bandwidth: LoRaBandwidth,
        datarate: LoRaSpreadingFactor,
        coderate: LoRaCodingRate,
    ) -> RxConfig {
        let (freq_hop_on, hop_period) = self.hop_period.as_driver_params();
        RxConfig {
            modem: Modem::LoRa,
            bandwidth: bandwidth as u32,
            datarate: datarate as u32,
            coderate: coderate as u8,
            bandwidth_afc: 0,
            preamble_len: self.preamble_len,
            symbol_timeout: self.symbol_timeout,
            fix_len: self.fix_len,
            payload_len: 0,
            crc_on: self.crc_on,
            freq_hop_on,
            hop_period,
            iq_inverted: self.iq_inverted.rx,
            continuous: self.continuous_rx,
        }
    }
}

/// Transmit parameters passed to [`RadioControl::set_tx_config`](crate::RadioControl::set_tx_config).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxConfig {
    pub modem: Modem,
    /// Output power in dBm.
    pub power: i8,
    pub fdev: u32,
    pub bandwidth: u32,
    pub datarate: u32,
    pub coderate: u8,
    pub preamble_len: u16,
    pub fix_len: bool,
    pub crc_on: bool,
    pub freq_hop_on: bool,
    pub hop_period: u8,
    pub iq_inverted: bool,
    pub timeout_ms: u32,
}

/// Receive parameters passed to [`RadioControl::set_rx_config`](crate::RadioControl::set_rx_config).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxConfig {
    pub modem: Modem,
    pub bandwidth: u32,
    pub datarate: u32,
    pub coderate: u8,
    /// AFC bandwidth (FSK only).
    pub bandwidth_afc: u32,
    pub preamble_len: u16,
    pub symbol_timeout: u16,
    pub fix_len: bool,
    /// Payload length when `fix_len` is set.
    pub payload_len: u8,
    pub crc_on: bool,
    pub freq_hop_on: bool,
    pub hop_period: u8,
    pub iq_inverted: bool,
    pub continuous: bool,
}

/// Errors in radio configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid configuration parameter.
    InvalidConfig(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid radio config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
