//! Error types for dispatch, registration and initialization.

use crate::event::HardwareEvent;
use std::fmt;

/// Errors reported by [`IrqBridge::handle_event`](crate::IrqBridge::handle_event).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The event resolved to a dispatch-table slot that holds no handler.
    HandlerNotConfigured {
        /// Event that was dispatched.
        event: HardwareEvent,
        /// Slot it resolved to.
        slot: usize,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandlerNotConfigured { event, slot } => {
                write!(f, "handler not configured for {} (slot {})", event, slot)
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// Errors reported when storing a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    /// Slot index is past the end of the table.
    SlotOutOfRange { index: usize, len: usize },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlotOutOfRange { index, len } => {
                write!(f, "slot {} out of range (table has {} slots)", index, len)
            }
        }
    }
}

impl std::error::Error for RegistrationError {}

/// Errors reported by [`IrqBridge::init`](crate::IrqBridge::init).
#[derive(Debug)]
pub enum InitError<E> {
    /// The radio driver failed to initialize or to enter sleep.
    Driver(E),
}

impl<E: fmt::Debug> fmt::Display for InitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver(e) => write!(f, "radio driver error: {:?}", e),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for InitError<E> {}
