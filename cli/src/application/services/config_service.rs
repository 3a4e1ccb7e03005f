//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::{AutoshipConfig, set_config_value, validate_config_key};

/// Load configuration.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(store: &impl ConfigStore) -> Result<AutoshipConfig> {
    store.load()
}

/// Validate and persist one setting, returning the updated configuration.
///
/// Nothing is written when the key or value is rejected.
///
/// # Errors
///
/// Returns a `ConfigError` for unknown keys or invalid values, or an I/O
/// error from the store.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<AutoshipConfig> {
    validate_config_key(key)?;
    let mut config = store.load()?;
    set_config_value(&mut config, key, value)?;
    store.save(&config)?;
    tracing::info!(%key, "configuration updated");
    Ok(config)
}
