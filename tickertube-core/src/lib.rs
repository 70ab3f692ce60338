//! Board-agnostic core logic for the Tickertube nixie ticker
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Nixie tube variants and their symbol tables
//! - Wiring table from (tube, cathode) to shift-register outputs
//! - Display pipeline: fetch, token scan, decode, encode, write
//! - Configuration types and the `tickertube.toml` parser
//! - The [`app::App`] that owns the RTC sequencer and the pipeline

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod app;
pub mod config;
pub mod display;
pub mod tube;

pub use app::App;
