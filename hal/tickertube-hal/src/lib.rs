//! Tickertube Hardware Abstraction Layer
//!
//! This crate defines the transport traits the Tickertube state machines
//! drive. Chip- and board-specific code (the firmware, the drivers crate)
//! implements them, so the same sequencing logic runs on the appliance and
//! against mocks on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  tickertube-core / tickertube-drivers   │
//! │  (display pipeline, RTC sequencer)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tickertube-hal (this crate - traits)   │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┼───────────┐
//!         ▼           ▼           ▼
//!    I2C transport  fetch     shift register
//!    (RTC bus)      (HTTP)    (74HC595 chain)
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Digital output
//! - [`spi::SpiBus`] - SPI bus operations
//! - [`i2c::I2cBus`] - Blocking I2C bus operations
//! - [`i2c::I2cTransport`] - Non-blocking, polled I2C transfers
//! - [`fetch::FetchTransport`] - Remote fetch with queued response events
//! - [`shift_register::ShiftRegisterTransport`] - Fire-and-forget latch output

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod fetch;
pub mod gpio;
pub mod i2c;
pub mod shift_register;
pub mod spi;

// Re-export key traits at crate root for convenience
pub use fetch::{FetchError, FetchEvent, FetchTransport, CHUNK_SIZE};
pub use gpio::OutputPin;
pub use i2c::{BlockingI2c, BusError, I2cBus, I2cTransport, TransferHandle, TransferStatus};
pub use shift_register::ShiftRegisterTransport;
pub use spi::SpiBus;
