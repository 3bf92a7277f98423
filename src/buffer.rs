//! Receive buffer slot.
//!
//! The consumer registers a destination for the next received frame. The
//! slot holds it as `Option<B>` so "no destination" is explicit, and copies
//! are always clamped to the destination's length.
//!
//! # Example
//!
//! ```
//! use sx12xx_irq::RxSlot;
//!
//! let mut storage = [0u8; 4];
//! let mut slot = RxSlot::new();
//! slot.set(&mut storage[..]);
//!
//! let copy = slot.fill(&[1, 2, 3, 4, 5]).unwrap();
//! assert_eq!(copy.copied, 4);
//! assert!(copy.truncated());
//!
//! slot.take();
//! assert_eq!(storage, [1, 2, 3, 4]);
//! ```

/// Result of copying a frame into a registered buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxCopy {
    /// Bytes written into the buffer.
    pub copied: usize,
    /// Bytes the frame actually had.
    pub received: usize,
}

impl RxCopy {
    /// Returns true if the frame did not fit.
    pub fn truncated(&self) -> bool {
        self.received > self.copied
    }
}

/// Optional destination for received frame bytes.
///
/// `B` is any byte storage: a borrowed `&mut [u8]`, a `Vec<u8>`, or a fixed
/// array. The slot never resizes it.
#[derive(Debug)]
pub struct RxSlot<B> {
    buf: Option<B>,
}

impl<B> Default for RxSlot<B> {
    fn default() -> Self {
        Self { buf: None }
    }
}

impl<B> RxSlot<B> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `buf`, returning any previously registered buffer.
    pub fn set(&mut self, buf: B) -> Option<B> {
        self.buf.replace(buf)
    }

    /// Clear the registration and hand the buffer back.
    pub fn take(&mut self) -> Option<B> {
        self.buf.take()
    }
}

impl<B> RxSlot<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Read-only view of the registered buffer.
    pub fn get(&self) -> Option<&[u8]> {
        self.buf.as_ref().map(|b| b.as_ref())
    }

    /// Copy `payload` into the registered buffer.
    ///
    /// Writes at most the buffer's length. Returns `None` when nothing is
    /// registered.
    pub fn fill(&mut self, payload: &[u8]) -> Option<RxCopy> {
        let dst = self.buf.as_mut()?.as_mut();
        let copied = payload.len().min(dst.len());
        dst[..copied].copy_from_slice(&payload[..copied]);
        Some(RxCopy {
            copied,
            received: payload.len(),
        })
    }
}
