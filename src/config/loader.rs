//! Environment-backed configuration loading
//!
//! Reads every `SHP_*` variable into a single [`Settings`] snapshot. The
//! snapshot is read once and handed to every consumer explicitly.

use crate::config::types::Settings;
use crate::error::ConfigError;
use config::{Config, Environment, Map};

/// Prefix shared by every variable this crate reads
pub const ENV_PREFIX: &str = "SHP";

/// Load settings from the process environment
pub fn load_settings() -> Result<Settings, ConfigError> {
    load(Environment::with_prefix(ENV_PREFIX))
}

/// Load settings from an explicit variable map (useful for testing)
///
/// Keys use the full environment names, e.g. `SHP_SITE_URL`.
pub fn load_settings_from_map(vars: Map<String, String>) -> Result<Settings, ConfigError> {
    load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
}

fn load(environment: Environment) -> Result<Settings, ConfigError> {
    let config = Config::builder()
        .add_source(environment)
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))
}
