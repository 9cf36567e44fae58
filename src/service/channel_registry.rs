// src/service/channel_registry.rs
//! Channel registry service
//!
//! Responsibilities:
//! - Hold the `ChannelConfig` for every registered channel, keyed by name.
//! - Replace-on-re-register semantics; channels are never deleted.
//! - Enable/disable channels without touching in-flight limiter or
//!   breaker state.

use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::model::channel::ChannelConfig;

/// Thread-safe map of channel name -> configuration.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, ChannelConfig>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a channel by name. Returns the stored config.
    pub async fn register(&self, config: ChannelConfig) -> ChannelConfig {
        let mut channels = self.channels.write().await;
        info!(
            channel = %config.name,
            channel_type = %config.channel_type,
            replaced = channels.contains_key(&config.name),
            "registering channel"
        );
        channels.insert(config.name.clone(), config.clone());
        config
    }

    pub async fn get(&self, name: &str) -> Option<ChannelConfig> {
        self.channels.read().await.get(name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        self.channels.read().await.keys().cloned().collect()
    }

    /// Flip the enabled flag. Returns false if the channel is unknown.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut channels = self.channels.write().await;
        match channels.get_mut(name) {
            Some(config) => {
                config.enabled = enabled;
                info!(channel = %name, enabled, "channel toggled");
                true
            }
            None => false,
        }
    }

    pub async fn enable(&self, name: &str) -> bool {
        self.set_enabled(name, true).await
    }

    pub async fn disable(&self, name: &str) -> bool {
        self.set_enabled(name, false).await
    }
}
