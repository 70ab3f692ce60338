//! Write-only SPI master
//!
//! The tube chain only ever shifts data out, so there is no read path.
//! Clock mode is fixed by the implementor; 74HC595 chains want mode 0.

/// SPI bus master
pub trait SpiBus {
    /// Error type for SPI operations
    type Error;

    /// Queue `data` for transmission, most significant bit first
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Block until every queued byte has left the shifter
    fn flush(&mut self) -> Result<(), Self::Error>;
}
