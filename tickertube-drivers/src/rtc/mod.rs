//! Real-time clock drivers
//!
//! - `mcp7940n`: Microchip MCP7940N battery-backed RTCC on I2C

pub mod bcd;
pub mod datetime;
pub mod mcp7940n;

pub use datetime::DateTime;
pub use mcp7940n::{Mcp7940n, RtcError, RtcState, RtcTask};
