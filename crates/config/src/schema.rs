use serde::{Deserialize, Serialize};
use spectrum_core::{BoundaryMode, Result, SpectrumError, SpectrumParams};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default bus device for the STTS22H variant.
pub const DEFAULT_I2C_DEVICE: &str = "/dev/i2c-1";
/// Default 7-bit STTS22H bus address.
pub const DEFAULT_I2C_ADDRESS: u16 = 0x3C;

/// Run configuration, loaded once at startup and never mutated.
///
/// Field names on disk match the `KEY=VALUE` format, so the same keys work
/// in a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumConfig {
    /// Number of sampling cycles.
    #[serde(rename = "CYCLES")]
    pub cycles: u32,
    /// Delay between cycles, in seconds.
    #[serde(rename = "CYCLWAIT")]
    pub cycle_wait: f64,
    /// Histogram threshold weight, a fraction of the full value range.
    #[serde(rename = "MININTVL")]
    pub min_interval_weight: f64,
    /// Histogram split factor.
    #[serde(rename = "SPLITTR")]
    pub split_factor: f64,

    #[serde(rename = "SAMPLER", default)]
    pub sampler: SamplerKind,
    #[serde(rename = "BOUNDS", default)]
    pub boundary: BoundaryMode,
    #[serde(rename = "I2CDEV", default = "default_i2c_device")]
    pub i2c_device: PathBuf,
    #[serde(rename = "I2CADDR", default = "default_i2c_address")]
    pub i2c_address: u16,
    /// Status polls allowed per reading before the device counts as hung.
    #[serde(rename = "POLLMAX", default = "default_poll_max")]
    pub poll_max: u32,
    /// Delay between status polls, in seconds.
    #[serde(rename = "POLLWAIT", default = "default_poll_wait")]
    pub poll_wait: f64,
    /// Extra attempts per cycle after a bus error.
    #[serde(rename = "RETRIES", default = "default_read_retries")]
    pub read_retries: u32,
    /// Seed for the synthetic sampler; random when absent.
    #[serde(rename = "SEED", default)]
    pub seed: Option<u64>,
    /// Case-insensitive label filter for the host sensor sampler.
    #[serde(rename = "SENSOR", default)]
    pub sensor_label: Option<String>,
}

fn default_i2c_device() -> PathBuf {
    PathBuf::from(DEFAULT_I2C_DEVICE)
}

fn default_i2c_address() -> u16 {
    DEFAULT_I2C_ADDRESS
}

fn default_poll_max() -> u32 {
    1000
}

fn default_poll_wait() -> f64 {
    0.01
}

fn default_read_retries() -> u32 {
    3
}

impl SpectrumConfig {
    /// Build a config from the four required values, defaulting the rest.
    pub fn new(cycles: u32, cycle_wait: f64, min_interval_weight: f64, split_factor: f64) -> Self {
        Self {
            cycles,
            cycle_wait,
            min_interval_weight,
            split_factor,
            sampler: SamplerKind::default(),
            boundary: BoundaryMode::default(),
            i2c_device: default_i2c_device(),
            i2c_address: default_i2c_address(),
            poll_max: default_poll_max(),
            poll_wait: default_poll_wait(),
            read_retries: default_read_retries(),
            seed: None,
            sensor_label: None,
        }
    }

    /// Parse the TOML form of the configuration.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| SpectrumError::Config(format!("TOML parse error: {e}")))
    }

    pub fn cycle_wait(&self) -> Result<Duration> {
        seconds("CYCLWAIT", self.cycle_wait)
    }

    pub fn poll_wait(&self) -> Result<Duration> {
        seconds("POLLWAIT", self.poll_wait)
    }

    pub fn spectrum_params(&self) -> SpectrumParams {
        SpectrumParams::new(self.min_interval_weight, self.split_factor)
            .with_boundary(self.boundary)
    }

    /// Check every value against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if self.cycles == 0 {
            return Err(SpectrumError::Config("CYCLES must be at least 1".into()));
        }
        self.cycle_wait()?;
        self.spectrum_params()
            .validate()
            .map_err(|e| SpectrumError::Config(e.to_string()))?;
        if self.poll_max == 0 {
            return Err(SpectrumError::Config("POLLMAX must be at least 1".into()));
        }
        self.poll_wait()?;
        if self.i2c_address > 0x7F {
            return Err(SpectrumError::Config(format!(
                "I2CADDR {:#x} is not a 7-bit address",
                self.i2c_address
            )));
        }
        Ok(())
    }
}

/// Convert a seconds value from the config into a `Duration`.
fn seconds(key: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| {
        SpectrumError::Config(format!(
            "{key} must be a non-negative number of seconds, got {secs}: {e}"
        ))
    })
}

/// Which sampler variant produces the readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SamplerKind {
    /// Uniform random integers in `[1, CYCLES]`.
    #[default]
    Synthetic,
    /// STTS22H temperature sensor on an I2C bus.
    Stts22h,
    /// Host temperature sensors via the OS.
    Host,
}

impl FromStr for SamplerKind {
    type Err = SpectrumError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synthetic" | "random" => Ok(Self::Synthetic),
            "stts22h" => Ok(Self::Stts22h),
            "host" => Ok(Self::Host),
            other => Err(SpectrumError::Config(format!(
                "unknown sampler '{other}' (expected synthetic, stts22h or host)"
            ))),
        }
    }
}
