//! Simple TOML parser for appliance configuration
//!
//! This is a minimal, allocation-free parser for the subset of TOML that
//! `tickertube.toml` uses. It does NOT support full TOML.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - [display], [rtc], [network] sections
//! - [tube.N] sections, numbered from 0 in display order
//! - Inline arrays of integer triples: cathodes = [[2, 0, 0], [3, 0, 1]]
//! - Comments (# ...)
//!
//! NOT supported:
//! - Multi-line strings or arrays
//! - Escape sequences in strings
//! - Dotted keys outside section headers
//!
//! Keys that are missing keep their [`AppConfig::default`] value. Once any
//! `[tube.N]` section appears, the default tubes are discarded and only the
//! listed ones are used.

use core::str::FromStr;

use heapless::{String, Vec};

use super::types::{AppConfig, CathodeConfig, TubeConfig};
use super::wiring::{WiringError, MAX_TUBES};
use crate::tube::{NixieType, MAX_CATHODES};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid or out-of-order section header
    InvalidSection,
    /// Invalid value type or string too long
    InvalidValue,
    /// Key not known in its section
    UnknownKey,
    /// Too many items (exceeded heapless capacity)
    TooManyItems,
    /// Wiring does not fit the declared chain
    InvalidWiring(WiringError),
}

impl From<WiringError> for ParseError {
    fn from(e: WiringError) -> Self {
        ParseError::InvalidWiring(e)
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Display,
    Rtc,
    Network,
    Tube(usize),
}

/// Parse TOML configuration into AppConfig
///
/// The wiring is validated before returning, so a successful parse always
/// yields a buildable display.
pub fn parse_config(input: &str) -> Result<AppConfig, ParseError> {
    let mut config = AppConfig::default();
    let mut section = Section::Root;
    let mut custom_tubes = false;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Check for section header
        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;

            if let Section::Tube(index) = section {
                if !custom_tubes {
                    config.display.tubes.clear();
                    custom_tubes = true;
                }
                // Tubes must be listed in order so their index is their position
                if index != config.display.tubes.len() {
                    return Err(ParseError::InvalidSection);
                }
                config
                    .display
                    .tubes
                    .push(TubeConfig::default())
                    .map_err(|_| ParseError::TooManyItems)?;
            }
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidValue)?;
        apply_value(section, key, value, &mut config)?;
    }

    config.display.wiring()?;
    Ok(config)
}

/// Parse section header like "display" or "tube.2"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    let header = header.trim();

    if let Some(index) = header.strip_prefix("tube.") {
        let index: usize = parse_int(index)?;
        if index >= MAX_TUBES {
            return Err(ParseError::TooManyItems);
        }
        return Ok(Section::Tube(index));
    }

    match header {
        "display" => Ok(Section::Display),
        "rtc" => Ok(Section::Rtc),
        "network" => Ok(Section::Network),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Apply one key to the section being parsed
fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut AppConfig,
) -> Result<(), ParseError> {
    match section {
        Section::Root => return Err(ParseError::UnknownKey),
        Section::Display => {
            let d = &mut config.display;
            match key {
                "request_url" => d.request_url = parse_heapless_string(value)?,
                "match_token" => d.match_token = parse_heapless_string(value)?,
                "fetch_interval_s" => d.fetch_interval_s = parse_int(value)?,
                "shift_registers" => d.shift_registers = parse_int(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Rtc => {
            let r = &mut config.rtc;
            match key {
                "i2c_frequency" => r.i2c_frequency = parse_int(value)?,
                "start_oscillator" => r.start_oscillator = parse_bool(value)?,
                "enable_battery_backup" => r.enable_battery_backup = parse_bool(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Network => {
            let n = &mut config.network;
            match key {
                "ssid" => n.ssid = parse_heapless_string(value)?,
                "password" => n.password = parse_heapless_string(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Tube(index) => {
            let tube = config
                .display
                .tubes
                .get_mut(index)
                .ok_or(ParseError::InvalidSection)?;
            match key {
                "type" => {
                    tube.tube_type =
                        NixieType::from_name(parse_string(value)).ok_or(ParseError::InvalidValue)?
                }
                "cathodes" => tube.cathodes = parse_cathodes(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
    }
    Ok(())
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

/// Parse a string value into fixed-capacity storage
fn parse_heapless_string<const N: usize>(value: &str) -> Result<String<N>, ParseError> {
    String::try_from(parse_string(value)).map_err(|_| ParseError::InvalidValue)
}

/// Parse an integer value
fn parse_int<T: FromStr>(value: &str) -> Result<T, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse `[[cathode, register, bit], ...]`
fn parse_cathodes(value: &str) -> Result<Vec<CathodeConfig, MAX_CATHODES>, ParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseError::InvalidValue)?;

    let mut cathodes = Vec::new();
    let mut rest = inner;
    while let Some(open) = rest.find('[') {
        // Only separators may sit between triples
        if !rest[..open].trim().trim_start_matches(',').trim().is_empty() {
            return Err(ParseError::InvalidValue);
        }
        let close = open + rest[open..].find(']').ok_or(ParseError::InvalidValue)?;
        let triple = parse_triple(&rest[open + 1..close])?;
        cathodes
            .push(triple)
            .map_err(|_| ParseError::TooManyItems)?;
        rest = &rest[close + 1..];
    }
    if !rest.trim().trim_start_matches(',').trim().is_empty() {
        return Err(ParseError::InvalidValue);
    }

    Ok(cathodes)
}

/// Parse `cathode, register, bit`
fn parse_triple(s: &str) -> Result<CathodeConfig, ParseError> {
    let mut parts = s.split(',');
    let mut next = || parts.next().ok_or(ParseError::InvalidValue);
    let cathode = parse_int(next()?)?;
    let register = parse_int(next()?)?;
    let bit = parse_int(next()?)?;
    if parts.next().is_some() {
        return Err(ParseError::InvalidValue);
    }
    Ok(CathodeConfig {
        cathode,
        register,
        bit,
    })
}
