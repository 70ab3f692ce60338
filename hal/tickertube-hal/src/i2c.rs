//! I2C bus abstractions
//!
//! Two flavours are provided:
//!
//! - [`I2cBus`] - a plain blocking master, as most chip HALs expose it
//! - [`I2cTransport`] - a non-blocking transport that hands out a
//!   [`TransferHandle`] per transaction and is polled for completion
//!
//! Register sequencers only talk to [`I2cTransport`]. [`BlockingI2c`]
//! bridges the two for boards whose I2C peripheral is driven synchronously.

use heapless::Vec;

/// Errors reported by an I2C transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Address or data byte not acknowledged
    Nack,
    /// Arbitration lost to another master
    ArbitrationLost,
    /// Bus error (misplaced start/stop)
    Bus,
    /// Transfer did not finish in time
    Timeout,
    /// Receive length exceeds what the transport can buffer
    BufferTooSmall,
    /// Handle does not name the transfer the transport knows about
    InvalidHandle,
    /// Other error
    Other,
}

/// Opaque identifier of one submitted transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferHandle(u16);

impl TransferHandle {
    /// Create a handle from a raw transport-specific value
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Get the raw value
    pub const fn raw(self) -> u16 {
        self.0
    }
}

/// Progress of a submitted transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferStatus {
    /// Still on the wire
    Pending,
    /// Finished; any received bytes have been copied out
    Complete,
    /// Finished with an error
    Error(BusError),
}

/// I2C bus master
///
/// Provides basic blocking read/write operations for communicating with
/// peripheral devices.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// This is commonly used to write a register address then read data.
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `write_data` - Bytes to write (typically register address)
    /// * `read_buf` - Buffer to read into
    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error>;
}

/// Non-blocking I2C transport
///
/// Submitting a transfer returns immediately with a handle; the caller
/// polls [`I2cTransport::status`] on later ticks. Only one transfer is
/// expected to be outstanding per caller.
pub trait I2cTransport {
    /// Start writing `data` to the device at `address`
    fn transmit(&mut self, address: u8, data: &[u8]) -> Result<TransferHandle, BusError>;

    /// Start writing `data`, then reading `rx_len` bytes after a repeated start
    fn transmit_then_receive(
        &mut self,
        address: u8,
        data: &[u8],
        rx_len: usize,
    ) -> Result<TransferHandle, BusError>;

    /// Query a transfer
    ///
    /// On [`TransferStatus::Complete`] the bytes received by a
    /// transmit-then-receive are copied into the front of `rx`.
    fn status(&mut self, handle: TransferHandle, rx: &mut [u8]) -> TransferStatus;
}

/// Largest receive that [`BlockingI2c`] can hold between submit and poll
pub const BLOCKING_RX_CAPACITY: usize = 32;

/// Outcome of the last transfer run by [`BlockingI2c`]
struct Finished {
    handle: TransferHandle,
    result: Result<Vec<u8, BLOCKING_RX_CAPACITY>, BusError>,
}

/// [`I2cTransport`] on top of a blocking [`I2cBus`]
///
/// The transfer runs to completion inside the submit call; its outcome is
/// reported by the next [`I2cTransport::status`] query, so callers see the
/// same submit-then-poll sequence as with an interrupt-driven transport.
pub struct BlockingI2c<B> {
    bus: B,
    next_handle: u16,
    finished: Option<Finished>,
}

impl<B> BlockingI2c<B>
where
    B: I2cBus,
    B::Error: Into<BusError>,
{
    /// Wrap a blocking bus
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            next_handle: 0,
            finished: None,
        }
    }

    /// Get access to the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Get mutable access to the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn record(&mut self, result: Result<Vec<u8, BLOCKING_RX_CAPACITY>, BusError>) -> TransferHandle {
        let handle = TransferHandle::new(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.finished = Some(Finished { handle, result });
        handle
    }
}

impl<B> I2cTransport for BlockingI2c<B>
where
    B: I2cBus,
    B::Error: Into<BusError>,
{
    fn transmit(&mut self, address: u8, data: &[u8]) -> Result<TransferHandle, BusError> {
        let result = self
            .bus
            .write(address, data)
            .map(|()| Vec::new())
            .map_err(Into::into);
        Ok(self.record(result))
    }

    fn transmit_then_receive(
        &mut self,
        address: u8,
        data: &[u8],
        rx_len: usize,
    ) -> Result<TransferHandle, BusError> {
        if rx_len > BLOCKING_RX_CAPACITY {
            return Err(BusError::BufferTooSmall);
        }

        let mut rx = [0u8; BLOCKING_RX_CAPACITY];
        let result = match self.bus.write_read(address, data, &mut rx[..rx_len]) {
            // Capacity checked above, so this cannot overflow
            Ok(()) => Vec::from_slice(&rx[..rx_len]).map_err(|_| BusError::BufferTooSmall),
            Err(e) => Err(e.into()),
        };
        Ok(self.record(result))
    }

    fn status(&mut self, handle: TransferHandle, rx: &mut [u8]) -> TransferStatus {
        match &self.finished {
            Some(finished) if finished.handle == handle => match &finished.result {
                Ok(data) => {
                    let len = data.len().min(rx.len());
                    rx[..len].copy_from_slice(&data[..len]);
                    TransferStatus::Complete
                }
                Err(e) => TransferStatus::Error(*e),
            },
            _ => TransferStatus::Error(BusError::InvalidHandle),
        }
    }
}
