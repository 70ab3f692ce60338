//! Nixie tube variants and their symbol tables
//!
//! A symbol is one ASCII byte of the display value. Each tube variant maps
//! the symbols it can show to a cathode index; the index is what the wiring
//! table is keyed by.
//!
//! IN-12A cathode order (pin numbering of the socket):
//!
//! ```text
//! index:   2   3   4   5   6   7   8   9  10  11  12
//! symbol: '0' '9' '8' '7' '6' '5' '4' '3' '2' '1' (',' on IN-12B)
//! ```

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of cathode slots per tube (indices 0..13)
pub const MAX_CATHODES: usize = 13;

/// Supported tube variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NixieType {
    /// Digits 0-9
    #[default]
    In12a,
    /// Digits 0-9 plus a decimal comma
    In12b,
}

impl NixieType {
    /// Cathode index lighting `symbol`, or `None` if the tube cannot show it
    pub fn symbol_to_cathode(self, symbol: u8) -> Option<u8> {
        match (self, symbol) {
            (_, b'0') => Some(2),
            (_, b'1'..=b'9') => Some(12 - (symbol - b'0')),
            (NixieType::In12b, b',') => Some(12),
            _ => None,
        }
    }

    /// Part number as printed on the tube
    pub const fn name(self) -> &'static str {
        match self {
            NixieType::In12a => "IN-12A",
            NixieType::In12b => "IN-12B",
        }
    }

    /// Look up a variant by part number (`IN-12A`, `in12a`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        let mut compact = [0u8; 8];
        let mut len = 0;
        for byte in name.bytes().filter(|b| *b != b'-') {
            if len == compact.len() {
                return None;
            }
            compact[len] = byte.to_ascii_lowercase();
            len += 1;
        }
        match &compact[..len] {
            b"in12a" => Some(NixieType::In12a),
            b"in12b" => Some(NixieType::In12b),
            _ => None,
        }
    }
}

impl fmt::Display for NixieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
