//! Configuration loading
//!
//! The appliance configuration is compiled in from `tickertube.toml`
//! (checked by build.rs) and parsed once at boot with the core no_std
//! parser.

use defmt::*;

use tickertube_core::config::{parse_config, AppConfig};

/// Embedded configuration (compiled into firmware)
/// Edit tickertube.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../tickertube.toml");

/// Parse the embedded configuration, falling back to the built-in defaults
pub fn load_config() -> AppConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Config loaded: {} tubes, {} shift registers, fetch every {}s",
                config.display.tubes.len(),
                config.display.shift_registers,
                config.display.fetch_interval_s
            );
            config
        }
        Err(e) => {
            error!("Config parse error: {}, using defaults", e);
            AppConfig::default()
        }
    }
}
