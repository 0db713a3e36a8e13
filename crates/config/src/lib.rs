pub mod parse;
pub mod schema;

pub use parse::parse_key_values;
pub use schema::{SamplerKind, SpectrumConfig, DEFAULT_I2C_ADDRESS, DEFAULT_I2C_DEVICE};

use spectrum_core::{Result, SpectrumError};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config location.
pub const CONFIG_ENV: &str = "SPECTRUM_CONFIG";
/// Config file looked up in the working directory by default.
pub const DEFAULT_FILE: &str = "SpecConfig";

/// Load and validate the run configuration.
///
/// Files ending in `.toml` are parsed as TOML; anything else as `KEY=VALUE`
/// lines. Unlike most settings there are no defaults for the four run
/// parameters, so a missing file is an error.
pub fn load(path: impl AsRef<Path>) -> Result<SpectrumConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| SpectrumError::Config(format!("cannot read '{}': {e}", path.display())))?;

    let config = if path.extension().is_some_and(|ext| ext == "toml") {
        SpectrumConfig::from_toml_str(&raw)?
    } else {
        parse_key_values(&raw)?
    };
    config.validate()?;

    tracing::info!(
        "Loaded config from '{}' (sampler: {:?})",
        path.display(),
        config.sampler
    );
    Ok(config)
}

/// Return the config path, honouring `$SPECTRUM_CONFIG`.
pub fn default_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE))
}
