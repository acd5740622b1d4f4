//! Simple TOML parser for the driver configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! the touch configuration. It does NOT support the full TOML language.
//!
//! Supported features:
//! - Key = value pairs (integers, decimal or `0x` hex, `_` separators)
//! - `[bus]`, `[boot]` and `[power]` section headers
//! - Comments (# ...)
//!
//! Keys not listed below are ignored so boards can carry extra settings:
//!
//! ```toml
//! [bus]
//! address = 0x4A
//! frequency_hz = 400_000
//!
//! [boot]
//! delay_ms = 200
//! poll_interval_ms = 10
//!
//! [power]
//! t7_idle = 100
//! t7_active = 20
//! t9_ctrl = 0x83
//! ```

use super::types::DriverConfig;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value is not an integer or does not fit its field
    InvalidValue,
    /// Line is neither a header, a comment nor `key = value`
    InvalidLine,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidSection => write!(f, "invalid section header"),
            Self::InvalidValue => write!(f, "invalid value"),
            Self::InvalidLine => write!(f, "invalid line"),
        }
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Bus,
    Boot,
    Power,
}

/// Parse TOML configuration into a [`DriverConfig`]
///
/// Fields missing from the input keep their defaults.
pub fn parse_config(input: &str) -> Result<DriverConfig, ConfigError> {
    let mut config = DriverConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            section = parse_section_header(line)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ConfigError::InvalidLine)?;
        apply_value(section, key, value, &mut config)?;
    }

    Ok(config)
}

/// Parse a header line like "[bus]"
fn parse_section_header(line: &str) -> Result<Section, ConfigError> {
    let line = strip_comment(line);
    let name = line
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or(ConfigError::InvalidSection)?;

    match name.trim() {
        "bus" => Ok(Section::Bus),
        "boot" => Ok(Section::Boot),
        "power" => Ok(Section::Power),
        _ => Err(ConfigError::InvalidSection),
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = strip_comment(&line[eq_pos + 1..]);

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn strip_comment(s: &str) -> &str {
    match s.find('#') {
        Some(pos) => s[..pos].trim(),
        None => s.trim(),
    }
}

/// Parse an unsigned integer, decimal or `0x` hex
fn parse_int(value: &str) -> Result<u32, ConfigError> {
    let mut digits = [0u8; 16];
    let mut len = 0;

    let (body, radix) = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (value, 10),
    };

    for b in body.bytes().filter(|&b| b != b'_') {
        if len == digits.len() {
            return Err(ConfigError::InvalidValue);
        }
        digits[len] = b;
        len += 1;
    }

    let digits = core::str::from_utf8(&digits[..len]).map_err(|_| ConfigError::InvalidValue)?;
    u32::from_str_radix(digits, radix).map_err(|_| ConfigError::InvalidValue)
}

fn parse_u8(value: &str) -> Result<u8, ConfigError> {
    u8::try_from(parse_int(value)?).map_err(|_| ConfigError::InvalidValue)
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut DriverConfig,
) -> Result<(), ConfigError> {
    match (section, key) {
        (Section::Bus, "address") => {
            let address = parse_u8(value)?;
            // 7-bit addressing only
            if address > 0x7F {
                return Err(ConfigError::InvalidValue);
            }
            config.i2c_address = address;
        }
        (Section::Bus, "frequency_hz") => {
            config.i2c_frequency_hz = parse_int(value)?;
        }
        (Section::Boot, "delay_ms") => config.boot_delay_ms = parse_int(value)?,
        (Section::Boot, "poll_interval_ms") => {
            let interval = parse_int(value)?;
            if interval == 0 {
                return Err(ConfigError::InvalidValue);
            }
            config.poll_interval_ms = interval;
        }
        (Section::Power, "t7_idle") => config.t7_idle = parse_u8(value)?,
        (Section::Power, "t7_active") => config.t7_active = parse_u8(value)?,
        (Section::Power, "t9_ctrl") => config.t9_ctrl_run = parse_u8(value)?,
        _ => {} // Ignore unknown keys
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(parse_config("").unwrap(), DriverConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
# Touch panel on I2C0
[bus]
address = 0x4B        # alternate strap
frequency_hz = 100_000

[boot]
delay_ms = 250
poll_interval_ms = 8

[power]
t7_idle = 255
t7_active = 16
t9_ctrl = 0x8B
"#;
        let config = parse_config(toml).unwrap();
        assert_eq!(config.i2c_address, 0x4B);
        assert_eq!(config.i2c_frequency_hz, 100_000);
        assert_eq!(config.boot_delay_ms, 250);
        assert_eq!(config.poll_interval_ms, 8);
        assert_eq!(config.t7_run(), [255, 16]);
        assert_eq!(config.t9_ctrl_run, 0x8B);
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let config = parse_config("[boot]\ndelay_ms = 500\n").unwrap();
        assert_eq!(config.boot_delay_ms, 500);
        assert_eq!(config.i2c_address, 0x4A);
        assert_eq!(config.t7_run(), [100, 20]);
    }

    #[test]
    fn test_unknown_key_ignored() {
        let config = parse_config("[bus]\nsda = 4\n").unwrap();
        assert_eq!(config, DriverConfig::default());
    }

    #[test]
    fn test_invalid_section() {
        assert_eq!(parse_config("[display]\n"), Err(ConfigError::InvalidSection));
        assert_eq!(parse_config("[bus\n"), Err(ConfigError::InvalidSection));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            parse_config("[power]\nt7_idle = 300\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[bus]\naddress = 0x80\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[boot]\npoll_interval_ms = 0\n"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[boot]\ndelay_ms = soon\n"),
            Err(ConfigError::InvalidValue)
        );
    }

    #[test]
    fn test_garbage_line() {
        assert_eq!(parse_config("[bus]\naddress\n"), Err(ConfigError::InvalidLine));
    }

    #[test]
    fn test_parse_int_forms() {
        assert_eq!(parse_int("42").unwrap(), 42);
        assert_eq!(parse_int("0x2a").unwrap(), 42);
        assert_eq!(parse_int("1_000").unwrap(), 1000);
        assert!(parse_int("-1").is_err());
    }
}
