//! Configuration type definitions
//!
//! These types describe one appliance: where the number comes from, how the
//! tubes are wired, how the RTC is brought up and which network to join.

use heapless::{String, Vec};

use super::wiring::{WiringError, WiringTable, MAX_TUBES};
use crate::tube::{NixieType, MAX_CATHODES};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum request URL length
pub const MAX_URL_LEN: usize = 128;

/// Maximum match token length
pub const MAX_TOKEN_LEN: usize = 32;

/// Maximum SSID length (802.11)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA2 passphrase length
pub const MAX_PASSWORD_LEN: usize = 64;

/// One cathode connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CathodeConfig {
    /// Cathode index (see the tube's symbol table)
    pub cathode: u8,
    /// Register index in the chain
    pub register: u8,
    /// Output bit within the register
    pub bit: u8,
}

/// One tube of the display
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TubeConfig {
    /// Tube variant
    pub tube_type: NixieType,
    /// Connected cathodes
    pub cathodes: Vec<CathodeConfig, MAX_CATHODES>,
}

/// Display and fetch configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    /// Resource to fetch
    pub request_url: String<MAX_URL_LEN>,
    /// Literal text that precedes the number in the response
    pub match_token: String<MAX_TOKEN_LEN>,
    /// Seconds between fetches
    pub fetch_interval_s: u32,
    /// Registers in the 74HC595 chain
    pub shift_registers: u8,
    /// Tubes in display order, leftmost first
    pub tubes: Vec<TubeConfig, MAX_TUBES>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let mut request_url = String::new();
        let _ = request_url.push_str("http://developer.blender.org/");
        let mut match_token = String::new();
        let _ = match_token.push_str(">Open Tasks (");

        let mut tubes = Vec::new();
        for tube in 0..4usize {
            let mut cathodes = Vec::new();
            for cathode in 2..12u8 {
                let output = tube * 10 + (cathode as usize - 2);
                let _ = cathodes.push(CathodeConfig {
                    cathode,
                    register: (output / 8) as u8,
                    bit: (output % 8) as u8,
                });
            }
            let _ = tubes.push(TubeConfig {
                tube_type: NixieType::In12a,
                cathodes,
            });
        }

        Self {
            request_url,
            match_token,
            fetch_interval_s: 300,
            shift_registers: 6,
            tubes,
        }
    }
}

impl DisplayConfig {
    /// Build and validate the wiring table
    pub fn wiring(&self) -> Result<WiringTable, WiringError> {
        let mut table = WiringTable::new(self.shift_registers as usize)?;
        for tube_config in &self.tubes {
            let tube = table.add_tube(tube_config.tube_type)?;
            for c in &tube_config.cathodes {
                table.connect(tube, c.cathode, c.register, c.bit)?;
            }
        }
        Ok(table)
    }
}

/// RTC bring-up configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RtcConfig {
    /// I2C clock in Hz
    pub i2c_frequency: u32,
    /// Set ST at boot
    pub start_oscillator: bool,
    /// Set VBATEN at boot
    pub enable_battery_backup: bool,
}

impl Default for RtcConfig {
    fn default() -> Self {
        Self {
            i2c_frequency: 100_000,
            start_oscillator: true,
            enable_battery_backup: true,
        }
    }
}

/// WiFi credentials
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkConfig {
    /// Network name
    pub ssid: String<MAX_SSID_LEN>,
    /// WPA2 passphrase; empty joins an open network
    pub password: String<MAX_PASSWORD_LEN>,
}

/// Complete appliance configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AppConfig {
    /// Display and fetch settings
    pub display: DisplayConfig,
    /// RTC settings
    pub rtc: RtcConfig,
    /// Network settings
    pub network: NetworkConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::wiring::CathodeWire;

    #[test]
    fn test_default_matches_appliance() {
        let config = AppConfig::default();
        assert_eq!(config.display.request_url.as_str(), "http://developer.blender.org/");
        assert_eq!(config.display.match_token.as_str(), ">Open Tasks (");
        assert_eq!(config.display.shift_registers, 6);
        assert_eq!(config.display.tubes.len(), 4);
        assert!(config
            .display
            .tubes
            .iter()
            .all(|t| t.tube_type == NixieType::In12a && t.cathodes.len() == 10));
        assert!(config.rtc.start_oscillator);
    }

    #[test]
    fn test_default_url_is_fetchable() {
        let config = DisplayConfig::default();
        let url = tickertube_drivers::http::parse_url(&config.request_url).unwrap();
        assert_eq!(url.host, "developer.blender.org");
        assert_eq!(url.port, 80);
    }

    #[test]
    fn test_default_wiring_is_sequential() {
        let config = DisplayConfig::default();
        let from_config = config.wiring().unwrap();
        let sequential = WiringTable::sequential(NixieType::In12a, 4, 6).unwrap();
        assert_eq!(from_config, sequential);
        assert_eq!(from_config.wire(1, 2), Some(CathodeWire { register: 1, bit: 2 }));
    }

    #[test]
    fn test_invalid_wiring_rejected() {
        let mut config = DisplayConfig::default();
        config.shift_registers = 2;
        assert_eq!(config.wiring(), Err(WiringError::RegisterOutOfRange));

        config.shift_registers = 9;
        assert_eq!(config.wiring(), Err(WiringError::TooManyRegisters));
    }
}
