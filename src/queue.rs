//! Bounded IRQ event queue.
//!
//! An interrupt handler that cannot borrow the [`IrqBridge`] posts the raw
//! [`HardwareEvent`] into an [`IrqSender`]; the polling loop owns the
//! [`IrqQueue`] and drains it into the bridge. Posting never blocks: when
//! the queue is full the event is dropped and counted.
//!
//! # Example
//!
//! ```
//! use sx12xx_irq::queue::irq_queue;
//! use sx12xx_irq::{HardwareEvent, IrqBridge, RadioEvents};
//!
//! let mut bridge: IrqBridge<Vec<u8>> = IrqBridge::new();
//! bridge
//!     .registrar()
//!     .register_line(0, |ev: &mut dyn RadioEvents| ev.on_tx_done())
//!     .unwrap();
//!
//! let (sender, mut queue) = irq_queue(8);
//! sender.notify(HardwareEvent::Dio0).unwrap();
//!
//! let mut outcomes = Vec::new();
//! queue.drain(&mut bridge, |event, result| outcomes.push((event, result)));
//! assert_eq!(outcomes.len(), 1);
//! ```

use crate::bridge::IrqBridge;
use crate::error::DispatchError;
use crate::event::{HardwareEvent, OperationState};
use log::{debug, warn};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Default queue depth.
pub const DEFAULT_QUEUE_DEPTH: usize = 32;

/// Create a bounded queue holding up to `capacity` events (minimum 1).
pub fn irq_queue(capacity: usize) -> (IrqSender, IrqQueue) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        IrqSender {
            tx,
            dropped: dropped.clone(),
        },
        IrqQueue { rx, dropped },
    )
}

/// Errors returned by [`IrqSender::notify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Queue is full; the event was dropped.
    Full(HardwareEvent),
    /// The receiving side is gone.
    Closed(HardwareEvent),
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(event) => write!(f, "irq queue full, dropped {}", event),
            Self::Closed(event) => write!(f, "irq queue closed, dropped {}", event),
        }
    }
}

impl std::error::Error for QueueError {}

/// Producer half, cloneable into every interrupt source.
#[derive(Debug, Clone)]
pub struct IrqSender {
    tx: mpsc::Sender<HardwareEvent>,
    dropped: Arc<AtomicU64>,
}

impl IrqSender {
    /// Post `event` without blocking.
    pub fn notify(&self, event: HardwareEvent) -> Result<(), QueueError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("irq queue full, dropping {}", event);
                Err(QueueError::Full(event))
            }
            Err(TrySendError::Closed(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(QueueError::Closed(event))
            }
        }
    }

    /// Events dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer half, owned by the polling loop.
#[derive(Debug)]
pub struct IrqQueue {
    rx: mpsc::Receiver<HardwareEvent>,
    dropped: Arc<AtomicU64>,
}

impl IrqQueue {
    /// Next queued event, if any.
    pub fn try_next(&mut self) -> Option<HardwareEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next event. Returns `None` once every sender is gone
    /// and the queue is empty.
    pub async fn recv(&mut self) -> Option<HardwareEvent> {
        self.rx.recv().await
    }

    /// Events currently queued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns true if no events are queued.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Events dropped because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Dispatch every queued event into `bridge`, in arrival order.
    ///
    /// `on_outcome` sees each event with its dispatch result. Returns the
    /// number of events dispatched.
    pub fn drain<B, F>(&mut self, bridge: &mut IrqBridge<B>, mut on_outcome: F) -> usize
    where
        B: AsRef<[u8]> + AsMut<[u8]>,
        F: FnMut(HardwareEvent, Result<OperationState, DispatchError>),
    {
        let mut processed = 0;
        while let Some(event) = self.try_next() {
            on_outcome(event, bridge.handle_event(event));
            processed += 1;
        }
        if processed > 0 {
            debug!("drained {} irq events", processed);
        }
        processed
    }
}
