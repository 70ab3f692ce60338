//! Adapters from `embedded-hal` 1.0 peripherals to the Tickertube HAL traits
//!
//! Chip HALs (embassy-rp and friends) implement the `embedded-hal` traits;
//! wrapping a peripheral here lets it back the blocking I2C adapter, the
//! 74HC595 chain or any other consumer of `tickertube-hal`.

use embedded_hal::digital::OutputPin as EhOutputPin;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use embedded_hal::spi::SpiBus as EhSpiBus;
use tickertube_hal::gpio::OutputPin;
use tickertube_hal::i2c::{BusError, I2cBus};
use tickertube_hal::spi::SpiBus;

/// Map an `embedded-hal` I2C error kind onto [`BusError`]
pub fn bus_error(kind: ErrorKind) -> BusError {
    match kind {
        ErrorKind::NoAcknowledge(_) => BusError::Nack,
        ErrorKind::ArbitrationLoss => BusError::ArbitrationLost,
        ErrorKind::Bus => BusError::Bus,
        _ => BusError::Other,
    }
}

/// Blocking I2C master backed by an `embedded-hal` implementation
pub struct HalI2c<T>(T);

impl<T: I2c> HalI2c<T> {
    /// Wrap a peripheral
    pub fn new(inner: T) -> Self {
        Self(inner)
    }
}

impl<T: I2c> I2cBus for HalI2c<T> {
    type Error = BusError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), BusError> {
        self.0.write(address, data).map_err(|e| bus_error(e.kind()))
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), BusError> {
        self.0
            .write_read(address, write_data, read_buf)
            .map_err(|e| bus_error(e.kind()))
    }
}

/// SPI bus backed by an `embedded-hal` implementation
pub struct HalSpi<T>(T);

impl<T: EhSpiBus> HalSpi<T> {
    /// Wrap a peripheral
    pub fn new(inner: T) -> Self {
        Self(inner)
    }
}

impl<T: EhSpiBus> SpiBus for HalSpi<T> {
    type Error = T::Error;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        EhSpiBus::write(&mut self.0, data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        EhSpiBus::flush(&mut self.0)
    }
}

/// Output pin backed by an `embedded-hal` implementation
///
/// The driven level is remembered locally so reading it back needs no
/// access to the peripheral.
pub struct HalOutputPin<P> {
    pin: P,
    high: bool,
}

impl<P: EhOutputPin> HalOutputPin<P> {
    /// Wrap a pin, driving it low
    pub fn new(mut pin: P) -> Self {
        // GPIO writes on the supported targets are infallible
        let _ = pin.set_low();
        Self { pin, high: false }
    }
}

impl<P: EhOutputPin> OutputPin for HalOutputPin<P> {
    fn set_high(&mut self) {
        let _ = self.pin.set_high();
        self.high = true;
    }

    fn set_low(&mut self) {
        let _ = self.pin.set_low();
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}
