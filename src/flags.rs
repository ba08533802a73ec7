// gSENSOR - Edge-triggered flags
//
// `IrqFlag` is the only state shared with interrupt/timer context. Everything
// else here is owned by the main loop and needs no atomics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-producer / single-consumer flag raised from interrupt context.
///
/// The producer stores with `Release`; the consumer reads and clears in one
/// `swap` so a trigger landing between the read and the clear is not lost.
#[derive(Debug, Clone, Default)]
pub struct IrqFlag(Arc<AtomicBool>);

impl IrqFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer side. Safe to call from a timer or GPIO callback.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Consumer side: returns `true` at most once per `raise`.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Loop-local consume-once boolean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeFlag(bool);

impl EdgeFlag {
    pub const fn raised() -> Self {
        Self(true)
    }

    pub fn raise(&mut self) {
        self.0 = true;
    }

    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.0)
    }

    pub fn is_raised(&self) -> bool {
        self.0
    }
}

/// Single-slot holder: a value is only accepted while the slot is empty and
/// is delivered to exactly one `take`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSlot<T>(Option<T>);

impl<T> Default for EventSlot<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> EventSlot<T> {
    /// Store `value` unless an earlier one is still pending. Returns whether
    /// it was stored.
    pub fn offer(&mut self, value: T) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(value);
        true
    }

    pub fn take(&mut self) -> Option<T> {
        self.0.take()
    }

    pub fn is_pending(&self) -> bool {
        self.0.is_some()
    }
}
