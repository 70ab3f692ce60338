//! Digital outputs
//!
//! Only push-pull outputs are needed: the shift-register latch, plus
//! whatever enable lines a board adds.

/// Digital output pin
pub trait OutputPin {
    /// Drive the pin high
    fn set_high(&mut self);

    /// Drive the pin low
    fn set_low(&mut self);

    /// Level last driven
    fn is_set_high(&self) -> bool;

    /// Rising edge followed by a return to low
    ///
    /// 74HC595 storage registers load on the rising edge of RCLK.
    fn pulse(&mut self) {
        self.set_low();
        self.set_high();
        self.set_low();
    }
}
