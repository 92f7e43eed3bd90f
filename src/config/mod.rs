//! Configuration module
//!
//! Resolves `SHP_*` environment variables into validated site configuration.

pub mod loader;
pub mod types;

pub use loader::{ENV_PREFIX, load_settings, load_settings_from_map};
pub use types::*;
