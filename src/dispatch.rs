//! Index-keyed handler tables.
//!
//! Drivers hand the bridge one handler per DIO line (and optionally per
//! timer) during initialization. Each handler is a zero-argument routine
//! from the driver's point of view: it inspects the chip and reports the
//! outcome through the [`RadioEvents`] it is given.

use crate::callbacks::RadioEvents;
use crate::error::RegistrationError;
use crate::event::{NUM_IRQ_HANDLES, NUM_TIMERS};

/// A routine run when its line or timer fires.
///
/// Implemented for any `FnMut(&mut dyn RadioEvents) + Send` closure.
pub trait IrqHandler: Send {
    /// Service the interrupt, reporting outcomes to `events`.
    fn on_irq(&mut self, events: &mut dyn RadioEvents);
}

impl<F> IrqHandler for F
where
    F: FnMut(&mut dyn RadioEvents) + Send,
{
    fn on_irq(&mut self, events: &mut dyn RadioEvents) {
        self(events)
    }
}

/// Owned handler as stored in a table.
pub type BoxedHandler = Box<dyn IrqHandler>;

/// What a successful registration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a replaced handler usually means the driver was initialized twice"]
pub enum Registration {
    /// Slot was empty.
    Registered,
    /// Slot already held a handler, which was dropped.
    Replaced,
}

/// Fixed-size, bounds-checked table of optional handlers.
pub struct HandlerTable<const N: usize> {
    slots: [Option<BoxedHandler>; N],
}

/// DIO line handlers, indexed by dispatch slot.
pub type LineTable = HandlerTable<NUM_IRQ_HANDLES>;

/// Driver timer handlers, indexed by [`TimerId::index`](crate::TimerId::index).
pub type TimerTable = HandlerTable<NUM_TIMERS>;

impl<const N: usize> Default for HandlerTable<N> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl<const N: usize> HandlerTable<N> {
    /// Create a table with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots.
    pub const fn len(&self) -> usize {
        N
    }

    /// Returns true if no slot holds a handler.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Number of populated slots.
    pub fn configured(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns true if `index` holds a handler.
    pub fn is_set(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Store `handler` at `index`.
    pub fn insert(
        &mut self,
        index: usize,
        handler: BoxedHandler,
    ) -> Result<Registration, RegistrationError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(RegistrationError::SlotOutOfRange { index, len: N })?;
        Ok(match slot.replace(handler) {
            Some(_) => Registration::Replaced,
            None => Registration::Registered,
        })
    }

    /// Overwrite every slot from `handlers`, including clearing slots whose
    /// entry is `None`.
    pub fn load(&mut self, handlers: [Option<BoxedHandler>; N]) {
        self.slots = handlers;
    }

    /// Handler at `index`, if configured.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut BoxedHandler> {
        self.slots.get_mut(index)?.as_mut()
    }
}

impl<const N: usize> std::fmt::Debug for HandlerTable<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let populated: Vec<usize> = (0..N).filter(|&i| self.is_set(i)).collect();
        f.debug_struct("HandlerTable")
            .field("len", &N)
            .field("populated", &populated)
            .finish()
    }
}
