//! Hardware events and operation outcomes.
//!
//! A [`HardwareEvent`] names the physical line or driver timer that fired.
//! The bridge resolves it to a [`Route`] (a dispatch-table slot or a timer
//! slot) and reports the result of the invoked handler as an
//! [`OperationState`].

use serde::Serialize;
use std::fmt;

/// Number of DIO handler slots a driver can register.
pub const NUM_IRQ_HANDLES: usize = 6;

/// Number of driver timers that can be dispatched.
pub const NUM_TIMERS: usize = 3;

/// A hardware line or timer event delivered by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HardwareEvent {
    /// DIO0 (TxDone / RxDone on most boards).
    Dio0,
    /// DIO1. Shares slot 0 with DIO0.
    Dio1,
    Dio2,
    Dio3,
    Dio4,
    Dio5,
    Timer1,
    Timer2,
    Timer3,
}

/// Where an event is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Index into the DIO dispatch table.
    Line(usize),
    /// Driver timer slot.
    Timer(TimerId),
}

impl HardwareEvent {
    /// All events, in line order then timer order.
    pub const ALL: [HardwareEvent; 9] = [
        Self::Dio0,
        Self::Dio1,
        Self::Dio2,
        Self::Dio3,
        Self::Dio4,
        Self::Dio5,
        Self::Timer1,
        Self::Timer2,
        Self::Timer3,
    ];

    /// Resolve this event to its dispatch route.
    ///
    /// The SX126x multiplexes every done/ready condition onto a single IRQ
    /// handler, so DIO0 and DIO1 both resolve to slot 0. Slot 1 is never
    /// dispatched.
    pub fn route(self) -> Route {
        match self {
            Self::Dio0 | Self::Dio1 => Route::Line(0),
            Self::Dio2 => Route::Line(2),
            Self::Dio3 => Route::Line(3),
            Self::Dio4 => Route::Line(4),
            Self::Dio5 => Route::Line(5),
            Self::Timer1 => Route::Timer(TimerId::Timer1),
            Self::Timer2 => Route::Timer(TimerId::Timer2),
            Self::Timer3 => Route::Timer(TimerId::Timer3),
        }
    }

    /// Returns true for the DIO line events.
    pub fn is_line(self) -> bool {
        matches!(self.route(), Route::Line(_))
    }
}

impl fmt::Display for HardwareEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dio0 => write!(f, "DIO0"),
            Self::Dio1 => write!(f, "DIO1"),
            Self::Dio2 => write!(f, "DIO2"),
            Self::Dio3 => write!(f, "DIO3"),
            Self::Dio4 => write!(f, "DIO4"),
            Self::Dio5 => write!(f, "DIO5"),
            Self::Timer1 => write!(f, "TIMER1"),
            Self::Timer2 => write!(f, "TIMER2"),
            Self::Timer3 => write!(f, "TIMER3"),
        }
    }
}

/// Identity of a driver timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TimerId {
    Timer1,
    Timer2,
    Timer3,
}

impl TimerId {
    /// Slot index in the timer table.
    pub fn index(self) -> usize {
        match self {
            Self::Timer1 => 0,
            Self::Timer2 => 1,
            Self::Timer3 => 2,
        }
    }
}

/// Outcome of the most recently dispatched radio operation.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum OperationState {
    /// No terminal outcome was reported by the last dispatch.
    #[default]
    Busy = 0,
    TxDone = 1,
    RxDone = 2,
    TxTimeout = 3,
    RxTimeout = 4,
    RxError = 5,
}

impl OperationState {
    /// Decode the raw representation stored in a [`StateCell`](crate::StateCell).
    ///
    /// Unknown values decode as `Busy`.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::TxDone,
            2 => Self::RxDone,
            3 => Self::TxTimeout,
            4 => Self::RxTimeout,
            5 => Self::RxError,
            _ => Self::Busy,
        }
    }

    /// Raw representation.
    pub fn as_raw(self) -> u8 {
        self as u8
    }

    /// Returns true once a handler has reported a terminal outcome.
    pub fn is_terminal(self) -> bool {
        self != Self::Busy
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Busy => "busy",
            Self::TxDone => "tx done",
            Self::RxDone => "rx done",
            Self::TxTimeout => "tx timeout",
            Self::RxTimeout => "rx timeout",
            Self::RxError => "rx error",
        };
        f.write_str(name)
    }
}
