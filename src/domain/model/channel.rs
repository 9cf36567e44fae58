// src/domain/model/channel.rs

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::domain::model::notification::NotificationPriority;

/// Supported notification channel types.
///
/// A transport implementation is registered per type; individual channels
/// (a named endpoint plus policy) reference their type's transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    Telegram,
    XTwitter,
    Email,
    Webhook,
    Discord,
    Sms,
    Console,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelType::Telegram => "telegram",
            ChannelType::XTwitter => "x_twitter",
            ChannelType::Email => "email",
            ChannelType::Webhook => "webhook",
            ChannelType::Discord => "discord",
            ChannelType::Sms => "sms",
            ChannelType::Console => "console",
        };
        write!(f, "{}", s)
    }
}

/// Identity and delivery policy for one channel endpoint.
///
/// Re-registering a config under an existing name replaces it and resets
/// that channel's rate-limit window, circuit-breaker state and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub channel_type: ChannelType,
    /// Unique name within the registry.
    pub name: String,
    /// Channel address: chat id, webhook URL, email address, ...
    pub endpoint: String,
    /// Credential for the transport, if the channel needs one.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Notifications below this priority are never delivered here.
    #[serde(default = "defaults::min_priority")]
    pub min_priority: NotificationPriority,
    #[serde(default = "defaults::rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,
    /// Number of retries after the first attempt (N retries = N+1 attempts).
    #[serde(default = "defaults::retry_count")]
    pub retry_count: u32,
    /// Base backoff delay; attempt `n` waits `retry_delay * 2^n`.
    #[serde(default = "defaults::retry_delay_seconds")]
    pub retry_delay_seconds: f64,
    /// Consecutive failures before the circuit breaker opens.
    #[serde(default = "defaults::circuit_breaker_threshold")]
    pub circuit_breaker_threshold: u32,
    /// Cooldown before an open breaker auto-resets.
    #[serde(default = "defaults::circuit_breaker_timeout_seconds")]
    pub circuit_breaker_timeout_seconds: u64,
    /// Upper bound on a single transport attempt. Timeout is retryable.
    #[serde(default = "defaults::send_timeout_seconds")]
    pub send_timeout_seconds: u64,
    #[serde(default)]
    pub metadata: BTreeMap<String, JsonValue>,
}

mod defaults {
    use crate::domain::model::notification::NotificationPriority;

    pub fn min_priority() -> NotificationPriority {
        NotificationPriority::Low
    }
    pub fn rate_limit_per_minute() -> u32 {
        60
    }
    pub fn enabled() -> bool {
        true
    }
    pub fn retry_count() -> u32 {
        3
    }
    pub fn retry_delay_seconds() -> f64 {
        1.0
    }
    pub fn circuit_breaker_threshold() -> u32 {
        5
    }
    pub fn circuit_breaker_timeout_seconds() -> u64 {
        300
    }
    pub fn send_timeout_seconds() -> u64 {
        30
    }
}

impl ChannelConfig {
    pub fn new(
        channel_type: ChannelType,
        name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            channel_type,
            name: name.into(),
            endpoint: endpoint.into(),
            api_key: None,
            min_priority: defaults::min_priority(),
            rate_limit_per_minute: defaults::rate_limit_per_minute(),
            enabled: defaults::enabled(),
            retry_count: defaults::retry_count(),
            retry_delay_seconds: defaults::retry_delay_seconds(),
            circuit_breaker_threshold: defaults::circuit_breaker_threshold(),
            circuit_breaker_timeout_seconds: defaults::circuit_breaker_timeout_seconds(),
            send_timeout_seconds: defaults::send_timeout_seconds(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_min_priority(mut self, min_priority: NotificationPriority) -> Self {
        self.min_priority = min_priority;
        self
    }

    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.rate_limit_per_minute = per_minute;
        self
    }

    pub fn with_retries(mut self, retry_count: u32, retry_delay_seconds: f64) -> Self {
        self.retry_count = retry_count;
        self.retry_delay_seconds = retry_delay_seconds;
        self
    }

    pub fn with_circuit_breaker(mut self, threshold: u32, timeout_seconds: u64) -> Self {
        self.circuit_breaker_threshold = threshold;
        self.circuit_breaker_timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_send_timeout(mut self, seconds: u64) -> Self {
        self.send_timeout_seconds = seconds;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay_seconds.max(0.0))
    }

    pub fn circuit_breaker_timeout(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker_timeout_seconds)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_seconds)
    }
}
