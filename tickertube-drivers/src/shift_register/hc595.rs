//! 74HC595 shift-register chain
//!
//! The chain is clocked by SPI (SER on MOSI, SRCLK on SCK) and latched by a
//! GPIO on RCLK. Output enable is tied low on the board.
//!
//! Bytes are shifted in slice order, so the first byte lands in the register
//! furthest from the MCU. The tube wiring table numbers registers in that
//! same order.

use tickertube_hal::gpio::OutputPin;
use tickertube_hal::shift_register::ShiftRegisterTransport;
use tickertube_hal::spi::SpiBus;

/// Chain of 74HC595 registers behind one SPI bus and latch pin
pub struct Hc595Chain<S, P> {
    spi: S,
    latch: P,
    latched: u32,
    failed: u32,
}

impl<S: SpiBus, P: OutputPin> Hc595Chain<S, P> {
    /// Create the driver; the latch idles low
    pub fn new(spi: S, mut latch: P) -> Self {
        latch.set_low();
        Self {
            spi,
            latch,
            latched: 0,
            failed: 0,
        }
    }

    /// Number of frames latched so far
    pub fn latched(&self) -> u32 {
        self.latched
    }

    /// Number of frames dropped because the SPI write failed
    pub fn failed(&self) -> u32 {
        self.failed
    }

    fn shift_out(&mut self, data: &[u8]) -> Result<(), S::Error> {
        self.spi.write(data)?;
        self.spi.flush()
    }
}

impl<S: SpiBus, P: OutputPin> ShiftRegisterTransport for Hc595Chain<S, P> {
    /// The SPI write completes inside [`Hc595Chain::send`]
    fn is_busy(&self) -> bool {
        false
    }

    fn send(&mut self, data: &[u8]) {
        if self.shift_out(data).is_err() {
            // Leave the previous frame on the outputs
            error!("shift register write failed");
            self.failed = self.failed.wrapping_add(1);
            return;
        }
        self.latch.pulse();
        self.latched = self.latched.wrapping_add(1);
        trace!("latched {} bytes", data.len());
    }
}
