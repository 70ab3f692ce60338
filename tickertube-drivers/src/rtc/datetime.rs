//! Calendar date and time as kept by the RTC

use core::fmt;

use super::bcd;

/// Number of consecutive timekeeping registers, RTCSEC through RTCYEAR
pub const DATE_TIME_REGISTERS: usize = 7;

/// Bits of each timekeeping register that hold the BCD value
///
/// Everything outside a mask is a control or status flag (ST, 12/24,
/// OSCRUN, PWRFAIL, VBATEN, LPYR) and must survive a date-time write.
pub const FIELD_MASKS: [u8; DATE_TIME_REGISTERS] = [
    0x7F, // seconds
    0x7F, // minutes
    0x3F, // hours (24-hour mode)
    0x07, // day of week
    0x3F, // day of month
    0x1F, // month (MTHTEN0 + MTHONE)
    0xFF, // year
];

/// Decimal date and time
///
/// Field order matches the register order on the chip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// Seconds (0-59)
    pub seconds: u8,
    /// Minutes (0-59)
    pub minutes: u8,
    /// Hours (0-23)
    pub hours: u8,
    /// Day of week (1-7, meaning is up to the user)
    pub day_of_week: u8,
    /// Day of month (1-31)
    pub day: u8,
    /// Month (1-12)
    pub month: u8,
    /// Year within the century (0-99)
    pub year: u8,
}

impl DateTime {
    /// Fields in register order
    pub const fn to_fields(&self) -> [u8; DATE_TIME_REGISTERS] {
        [
            self.seconds,
            self.minutes,
            self.hours,
            self.day_of_week,
            self.day,
            self.month,
            self.year,
        ]
    }

    /// Build from fields in register order
    pub const fn from_fields(fields: [u8; DATE_TIME_REGISTERS]) -> Self {
        Self {
            seconds: fields[0],
            minutes: fields[1],
            hours: fields[2],
            day_of_week: fields[3],
            day: fields[4],
            month: fields[5],
            year: fields[6],
        }
    }

    /// Check every field is inside its calendar range
    pub fn is_valid(&self) -> bool {
        self.seconds < 60
            && self.minutes < 60
            && self.hours < 24
            && (1..=7).contains(&self.day_of_week)
            && (1..=31).contains(&self.day)
            && (1..=12).contains(&self.month)
            && self.year <= 99
    }

    /// Decode the seven timekeeping registers
    ///
    /// Flag bits outside [`FIELD_MASKS`] are ignored.
    pub fn unpack(registers: &[u8; DATE_TIME_REGISTERS]) -> Self {
        let mut fields = [0u8; DATE_TIME_REGISTERS];
        for ((field, &raw), &mask) in fields.iter_mut().zip(registers).zip(&FIELD_MASKS) {
            *field = bcd::decode(raw & mask);
        }
        Self::from_fields(fields)
    }

    /// Encode into the seven timekeeping registers in place
    ///
    /// `registers` must hold the current chip contents; bits outside each
    /// field mask are kept.
    pub fn pack_into(&self, registers: &mut [u8; DATE_TIME_REGISTERS]) {
        for ((reg, value), &mask) in registers.iter_mut().zip(self.to_fields()).zip(&FIELD_MASKS) {
            *reg = (*reg & !mask) | (bcd::encode(value) & mask);
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hours, self.minutes, self.seconds
        )
    }
}
