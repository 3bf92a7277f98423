//! Radio outcome callbacks and the receive metadata snapshot.
//!
//! Drivers report terminal outcomes through [`RadioEvents`]. The bridge
//! implements it internally; handlers registered in the dispatch table are
//! handed a `&mut dyn RadioEvents` each time they run.

use serde::Serialize;

/// Callbacks a radio driver invokes when an operation finishes.
///
/// Mirrors the five terminal outcomes of a Semtech-style radio driver.
pub trait RadioEvents {
    /// A transmission completed.
    fn on_tx_done(&mut self);

    /// A frame was received.
    ///
    /// `payload` is the full received frame; its length is reported as the
    /// received length even if the destination buffer is smaller.
    fn on_rx_done(&mut self, payload: &[u8], rssi: i16, snr: i8);

    /// Transmission did not complete in time.
    fn on_tx_timeout(&mut self);

    /// No frame arrived within the receive window.
    fn on_rx_timeout(&mut self);

    /// A frame arrived but failed validation (CRC or header error).
    fn on_rx_error(&mut self);
}

/// Link metadata captured on the last receive-complete event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RxMetadata {
    /// Length of the received frame, before any clamping to the buffer.
    pub len: u16,
    /// Received signal strength in dBm.
    pub rssi: i16,
    /// Signal-to-noise ratio in dB.
    pub snr: i8,
}

impl RxMetadata {
    /// Build a snapshot for a frame of `payload_len` bytes.
    ///
    /// Lengths that do not fit in `u16` saturate.
    pub fn new(payload_len: usize, rssi: i16, snr: i8) -> Self {
        Self {
            len: u16::try_from(payload_len).unwrap_or(u16::MAX),
            rssi,
            snr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_metadata_is_empty() {
        let meta = RxMetadata::default();
        assert_eq!(meta.len, 0);
        assert_eq!(meta.rssi, 0);
        assert_eq!(meta.snr, 0);
    }

    #[test]
    fn test_oversized_length_saturates() {
        let meta = RxMetadata::new(70_000, -120, -5);
        assert_eq!(meta.len, u16::MAX);
        assert_eq!(meta.rssi, -120);
        assert_eq!(meta.snr, -5);
    }
}
