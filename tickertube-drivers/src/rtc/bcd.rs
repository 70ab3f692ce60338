//! Packed binary-coded decimal
//!
//! The MCP7940N keeps every timekeeping field as two BCD nibbles: tens in
//! the high nibble, units in the low one.

/// Encode a decimal value (0-99) as packed BCD
///
/// Values above 99 do not fit two nibbles; the result is truncated.
pub const fn encode(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Decode a packed BCD byte
pub const fn decode(bcd: u8) -> u8 {
    10 * (bcd >> 4) + (bcd & 0x0F)
}
