//! Shift-register chain output
//!
//! Bytes are shifted out in slice order and latched in one step. The first
//! byte ends up in the register furthest from the data input.

/// Fire-and-forget output to a chain of serial-in/parallel-out registers
pub trait ShiftRegisterTransport {
    /// True while a previous send is still being clocked out
    fn is_busy(&self) -> bool;

    /// Shift `data` into the chain and latch it
    ///
    /// Callers check [`ShiftRegisterTransport::is_busy`] first. Completion
    /// is not reported.
    fn send(&mut self, data: &[u8]);
}
