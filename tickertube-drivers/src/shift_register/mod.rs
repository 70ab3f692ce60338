//! Shift-register chain drivers
//!
//! - `hc595`: 74HC595 serial-in/parallel-out chain clocked by SPI

pub mod hc595;

pub use hc595::Hc595Chain;
