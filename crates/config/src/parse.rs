use crate::schema::SpectrumConfig;
use spectrum_core::{Result, SpectrumError};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use tracing::warn;

const KNOWN_KEYS: &[&str] = &[
    "CYCLES", "CYCLWAIT", "MININTVL", "SPLITTR", "SAMPLER", "BOUNDS", "I2CDEV", "I2CADDR",
    "POLLMAX", "POLLWAIT", "RETRIES", "SEED", "SENSOR",
];

/// A value together with the line it came from, for error messages.
struct Entry<'a> {
    line: usize,
    value: &'a str,
}

/// Parse newline-separated `KEY=VALUE` text into a [`SpectrumConfig`].
///
/// Blank lines and `#` comments are skipped. Unknown keys are ignored with a
/// warning; a repeated key keeps its last value. Range checks are left to
/// [`SpectrumConfig::validate`].
pub fn parse_key_values(raw: &str) -> Result<SpectrumConfig> {
    let mut entries: HashMap<&str, Entry<'_>> = HashMap::new();

    for (idx, line) in raw.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(SpectrumError::Config(format!(
                "line {line_no}: expected KEY=VALUE, got '{line}'"
            )));
        };
        let key = key.trim();
        if !KNOWN_KEYS.contains(&key) {
            warn!("Ignoring unknown config key '{key}' on line {line_no}");
            continue;
        }
        let entry = Entry {
            line: line_no,
            value: value.trim(),
        };
        if let Some(prev) = entries.insert(key, entry) {
            warn!(
                "Config key '{key}' on line {line_no} overrides line {}",
                prev.line
            );
        }
    }

    let mut config = SpectrumConfig::new(
        required(&entries, "CYCLES")?,
        required(&entries, "CYCLWAIT")?,
        required(&entries, "MININTVL")?,
        required(&entries, "SPLITTR")?,
    );

    if let Some(sampler) = optional(&entries, "SAMPLER")? {
        config.sampler = sampler;
    }
    if let Some(boundary) = optional(&entries, "BOUNDS")? {
        config.boundary = boundary;
    }
    if let Some(device) = optional(&entries, "I2CDEV")? {
        config.i2c_device = device;
    }
    if let Some(entry) = entries.get("I2CADDR") {
        config.i2c_address = parse_address(entry.value)
            .map_err(|e| invalid("I2CADDR", entry, e))?;
    }
    if let Some(poll_max) = optional(&entries, "POLLMAX")? {
        config.poll_max = poll_max;
    }
    if let Some(poll_wait) = optional(&entries, "POLLWAIT")? {
        config.poll_wait = poll_wait;
    }
    if let Some(retries) = optional(&entries, "RETRIES")? {
        config.read_retries = retries;
    }
    config.seed = optional(&entries, "SEED")?;
    config.sensor_label = optional::<String>(&entries, "SENSOR")?.filter(|s| !s.is_empty());

    Ok(config)
}

fn required<T>(entries: &HashMap<&str, Entry<'_>>, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    optional(entries, key)?
        .ok_or_else(|| SpectrumError::Config(format!("missing required key '{key}'")))
}

fn optional<T>(entries: &HashMap<&str, Entry<'_>>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    entries
        .get(key)
        .map(|entry| entry.value.parse::<T>().map_err(|e| invalid(key, entry, e)))
        .transpose()
}

fn invalid(key: &str, entry: &Entry<'_>, reason: impl Display) -> SpectrumError {
    SpectrumError::Config(format!(
        "line {}: invalid value '{}' for {key}: {reason}",
        entry.line, entry.value
    ))
}

/// Accept decimal (`60`) or hex (`0x3C`) bus addresses.
fn parse_address(value: &str) -> std::result::Result<u16, std::num::ParseIntError> {
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    }
}
