use thiserror::Error;

/// Top-level error type used across the entire application.
#[derive(Debug, Error)]
pub enum SpectrumError {
    #[error("config error: {0}")]
    Config(String),

    #[error("cannot build a spectrum from an empty sample set")]
    EmptySamples,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("bus error: {0}")]
    Bus(String),

    #[error("timeout waiting for device: still busy after {attempts} status polls")]
    DeviceTimeout { attempts: u32 },

    #[error("system error: {0}")]
    System(String),
}

impl SpectrumError {
    /// Whether retrying the same operation may succeed.
    ///
    /// Only bus transfer failures qualify; a device that never clears its
    /// busy flag has already been polled to its limit.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Bus(_))
    }
}

pub type Result<T, E = SpectrumError> = std::result::Result<T, E>;
