//! Interrupt-to-state bridge for SX126x/SX127x LoRa transceivers.
//!
//! The radio driver reports every operation through interrupt lines (DIO)
//! and timers. This crate turns those raw events into operation outcomes
//! (tx done, rx done, timeouts, errors), copies received frames into a
//! consumer-owned buffer and keeps the last link metadata.
//!
//! - [`bridge`]: the per-radio dispatch context
//! - [`dispatch`]: bounds-checked handler tables
//! - [`driver`]: traits a radio driver implements
//! - [`queue`]: bounded queue from interrupt context to the polling loop
//! - [`radio`]: facade that configures the modem and maps outcomes
//! - [`sim`]: simulated driver for host testing

pub mod bridge;
pub mod buffer;
pub mod callbacks;
pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod event;
pub mod queue;
pub mod radio;
pub mod sim;
pub mod state;
pub mod stats;

// Re-export commonly used items
pub use bridge::IrqBridge;
pub use buffer::{RxCopy, RxSlot};
pub use callbacks::{RadioEvents, RxMetadata};
pub use config::RadioSettings;
pub use dispatch::{BoxedHandler, HandlerTable, IrqHandler, LineTable, Registration, TimerTable};
pub use driver::{IrqRegistrar, RadioControl, RadioDriver};
pub use error::{DispatchError, InitError, RegistrationError};
pub use event::{HardwareEvent, OperationState, Route, TimerId, NUM_IRQ_HANDLES, NUM_TIMERS};
pub use queue::{irq_queue, IrqQueue, IrqSender, QueueError};
pub use radio::{RadioError, Response, RxQuality, Sx12xx};
pub use state::{StateCell, StateWatch};
pub use stats::DispatchStats;
