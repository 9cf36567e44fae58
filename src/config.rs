// src/config.rs
//! Dispatcher configuration.
//!
//! Loaded from an optional TOML/JSON file overlaid with `NOTIFY_`-prefixed
//! environment variables (e.g. `NOTIFY_BATCH_MAX_SIZE=25`).

use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Tunables owned by the dispatcher itself. Per-channel policy lives on
/// `ChannelConfig`.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherConfig {
    /// Queue length at which the batch queue flushes itself.
    #[serde(default = "defaults::batch_max_size")]
    pub batch_max_size: usize,
    /// Suggested cadence for the caller's periodic `flush_batch()` call.
    /// The dispatcher owns no timer; this is advisory.
    #[serde(default = "defaults::batch_interval_seconds")]
    pub batch_interval_seconds: u64,
}

mod defaults {
    pub fn batch_max_size() -> usize {
        10
    }
    pub fn batch_interval_seconds() -> u64 {
        60
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_max_size: defaults::batch_max_size(),
            batch_interval_seconds: defaults::batch_interval_seconds(),
        }
    }
}

impl DispatcherConfig {
    /// Load from an optional file plus environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if path.exists() {
                builder = builder.add_source(File::from(path.to_path_buf()));
                info!(?path, "loaded dispatcher config file");
            } else {
                info!(?path, "dispatcher config file not found, using defaults");
            }
        }

        builder = builder.add_source(Environment::with_prefix("NOTIFY").separator("__"));
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = DispatcherConfig::default();
        assert_eq!(config.batch_max_size, 10);
        assert_eq!(config.batch_interval_seconds, 60);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = DispatcherConfig::load(None).unwrap();
        assert_eq!(config.batch_max_size, 10);
    }
}
