//! Appliance configuration
//!
//! Types describing one display, its RTC and network, a validated wiring
//! table built from them, and a small TOML parser for `tickertube.toml`.

pub mod toml;
pub mod types;
pub mod wiring;

pub use self::toml::{parse_config, ParseError};
pub use types::*;
pub use wiring::*;
