//! Build script for tickertube-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates tickertube.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Limits shared with tickertube-core
const MAX_TUBES: usize = 8;
const MAX_SHIFT_REGISTERS: i64 = 8;
const MAX_CATHODES: i64 = 13;
const MAX_URL_LEN: usize = 128;
const MAX_TOKEN_LEN: usize = 32;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate tickertube.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=tickertube.toml");

    let config_path = Path::new("tickertube.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: tickertube.toml not found!                               ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a tickertube.toml configuration file.     ║\n\
            ║  Please create one in the tickertube-firmware directory.         ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read tickertube.toml                           ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in tickertube.toml                   ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    let shift_registers = validate_display(&config, &mut errors);
    validate_rtc(&config, &mut errors);
    validate_tubes(&config, shift_registers, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid configuration in tickertube.toml                 ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=tickertube.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validate [display]; returns the declared chain length
fn validate_display(config: &toml::Value, errors: &mut Vec<String>) -> i64 {
    let display = match config.get("display") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[display] must be a table".into());
            return 0;
        }
        None => return 6,
    };

    if let Some(url) = display.get("request_url") {
        match url.as_str() {
            Some(url) if url.starts_with("https://") => {
                errors.push("[display] request_url: https is not supported".into())
            }
            Some(url) if !url.starts_with("http://") => {
                errors.push("[display] request_url must start with http://".into())
            }
            Some(url) if url.len() > MAX_URL_LEN => errors.push(format!(
                "[display] request_url longer than {} bytes",
                MAX_URL_LEN
            )),
            Some(_) => {}
            None => errors.push("[display] request_url must be a string".into()),
        }
    }

    if let Some(token) = display.get("match_token") {
        match token.as_str() {
            Some("") => errors.push("[display] match_token cannot be empty".into()),
            Some(t) if t.len() > MAX_TOKEN_LEN => errors.push(format!(
                "[display] match_token longer than {} bytes",
                MAX_TOKEN_LEN
            )),
            Some(_) => {}
            None => errors.push("[display] match_token must be a string".into()),
        }
    }

    if let Some(interval) = display.get("fetch_interval_s") {
        match interval.as_integer() {
            Some(i) if i >= 1 => {}
            _ => errors.push("[display] fetch_interval_s must be at least 1".into()),
        }
    }

    match display.get("shift_registers").map(|v| v.as_integer()) {
        Some(Some(n)) if (1..=MAX_SHIFT_REGISTERS).contains(&n) => n,
        Some(_) => {
            errors.push(format!(
                "[display] shift_registers must be 1-{}",
                MAX_SHIFT_REGISTERS
            ));
            0
        }
        None => 6,
    }
}

/// Validate [rtc]
fn validate_rtc(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(rtc) = config.get("rtc").and_then(|r| r.as_table()) else {
        return;
    };

    if let Some(freq) = rtc.get("i2c_frequency") {
        match freq.as_integer() {
            Some(f) if (1..=400_000).contains(&f) => {}
            _ => errors.push("[rtc] i2c_frequency must be 1-400000 Hz".into()),
        }
    }

    for key in ["start_oscillator", "enable_battery_backup"] {
        if let Some(value) = rtc.get(key) {
            if !value.is_bool() {
                errors.push(format!("[rtc] {} must be true or false", key));
            }
        }
    }
}

/// Validate [tube.N] sections against the chain length
fn validate_tubes(config: &toml::Value, shift_registers: i64, errors: &mut Vec<String>) {
    let tubes = match config.get("tube") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[tube.N] sections must be tables".into());
            return;
        }
        None => return,
    };

    if tubes.len() > MAX_TUBES {
        errors.push(format!("at most {} tubes are supported", MAX_TUBES));
    }

    for index in 0..tubes.len() {
        if !tubes.contains_key(&index.to_string()) {
            errors.push(format!("[tube.{}] missing, tubes must be numbered from 0", index));
        }
    }

    for (name, tube) in tubes {
        let Some(tube) = tube.as_table() else {
            errors.push(format!("[tube.{}] must be a table", name));
            continue;
        };

        if let Some(kind) = tube.get("type") {
            match kind.as_str() {
                Some("IN-12A") | Some("IN-12B") => {}
                _ => errors.push(format!("[tube.{}] type must be IN-12A or IN-12B", name)),
            }
        }

        let Some(cathodes) = tube.get("cathodes") else {
            continue;
        };
        let Some(cathodes) = cathodes.as_array() else {
            errors.push(format!("[tube.{}] cathodes must be an array", name));
            continue;
        };

        for (i, entry) in cathodes.iter().enumerate() {
            let triple: Option<Vec<i64>> = entry
                .as_array()
                .map(|a| a.iter().filter_map(|v| v.as_integer()).collect());
            match triple.as_deref() {
                Some([cathode, register, bit]) => {
                    if !(0..MAX_CATHODES).contains(cathode) {
                        errors.push(format!("[tube.{}] entry {}: cathode out of range", name, i));
                    }
                    if !(0..shift_registers).contains(register) {
                        errors.push(format!("[tube.{}] entry {}: register out of range", name, i));
                    }
                    if !(0..8).contains(bit) {
                        errors.push(format!("[tube.{}] entry {}: bit must be 0-7", name, i));
                    }
                }
                _ => errors.push(format!(
                    "[tube.{}] entry {} must be [cathode, register, bit]",
                    name, i
                )),
            }
        }
    }
}
