//! Hardware driver implementations
//!
//! This crate provides the chip-level pieces of Tickertube on top of the
//! transport traits in tickertube-hal:
//!
//! - RTC (MCP7940N register-access sequencer, BCD date-time codec)
//! - Shift registers (74HC595 chain over SPI with a latch pin)
//! - Bus adapters from `embedded-hal` 1.0 peripherals to the HAL traits
//! - HTTP/1.0 request and response-head helpers for the fetch task

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod bus;
pub mod http;
pub mod rtc;
pub mod shift_register;
