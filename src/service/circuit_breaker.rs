// src/service/circuit_breaker.rs
//! Per-channel circuit breaker.
//!
//! A plain failure counter with a time-based auto-reset: after
//! `circuit_breaker_threshold` recorded failures the breaker opens, and
//! any `allow` call at least `circuit_breaker_timeout` after opening
//! closes it again and zeroes the counter. There is no half-open probe
//! state; the first post-cooldown request is an ordinary request, and if
//! it fails the counter starts climbing from zero. A true half-open
//! probe would be a stricter alternative.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::model::channel::ChannelConfig;

#[derive(Debug, Default, Clone)]
struct BreakerEntry {
    failure_count: u32,
    last_failure: Option<DateTime<Utc>>,
    opened_at: Option<DateTime<Utc>>,
    is_open: bool,
}

/// Snapshot of one channel's breaker, for ops and tests.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerState {
    pub is_open: bool,
    pub failure_count: u32,
    pub last_failure: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub cooldown_until: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct CircuitBreaker {
    states: Mutex<HashMap<String, BreakerEntry>>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a request may proceed. Closes the breaker as a side effect
    /// once the cooldown has elapsed.
    pub async fn allow(&self, config: &ChannelConfig) -> bool {
        let mut states = self.states.lock().await;
        let entry = states.entry(config.name.clone()).or_default();

        if !entry.is_open {
            return true;
        }

        if let Some(opened_at) = entry.opened_at {
            let cooldown =
                ChronoDuration::seconds(config.circuit_breaker_timeout_seconds as i64);
            if Utc::now() - opened_at >= cooldown {
                info!(channel = %config.name, "circuit breaker cooldown elapsed, closing");
                entry.is_open = false;
                entry.failure_count = 0;
                return true;
            }
        }

        false
    }

    /// Record a failed delivery attempt. Opens the breaker at threshold;
    /// idempotent while already open.
    pub async fn record_failure(&self, config: &ChannelConfig) {
        let mut states = self.states.lock().await;
        let entry = states.entry(config.name.clone()).or_default();

        entry.failure_count += 1;
        entry.last_failure = Some(Utc::now());

        if entry.failure_count >= config.circuit_breaker_threshold && !entry.is_open {
            entry.is_open = true;
            entry.opened_at = Some(Utc::now());
            warn!(
                channel = %config.name,
                failures = entry.failure_count,
                "circuit breaker opened"
            );
        }
    }

    /// Record a successful delivery. Resets the failure counter only;
    /// an open breaker stays open until its cooldown rule closes it.
    pub async fn record_success(&self, channel_name: &str) {
        let mut states = self.states.lock().await;
        if let Some(entry) = states.get_mut(channel_name) {
            entry.failure_count = 0;
        }
    }

    /// Drop all state for a channel (used on re-registration).
    pub async fn reset(&self, channel_name: &str) {
        self.states
            .lock()
            .await
            .insert(channel_name.to_string(), BreakerEntry::default());
    }

    pub async fn state(&self, config: &ChannelConfig) -> CircuitBreakerState {
        let states = self.states.lock().await;
        let entry = states.get(&config.name).cloned().unwrap_or_default();
        let cooldown_until = entry.opened_at.map(|t| {
            t + ChronoDuration::seconds(config.circuit_breaker_timeout_seconds as i64)
        });

        CircuitBreakerState {
            is_open: entry.is_open,
            failure_count: entry.failure_count,
            last_failure: entry.last_failure,
            opened_at: entry.opened_at,
            cooldown_until,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::channel::ChannelType;
    use tokio::time::{sleep, Duration};

    fn channel(threshold: u32, timeout_seconds: u64) -> ChannelConfig {
        ChannelConfig::new(ChannelType::Telegram, "tg", "chat-1")
            .with_circuit_breaker(threshold, timeout_seconds)
    }

    #[tokio::test]
    async fn opens_at_threshold() {
        let breaker = CircuitBreaker::new();
        let config = channel(3, 300);

        for _ in 0..2 {
            breaker.record_failure(&config).await;
            assert!(breaker.allow(&config).await);
        }
        breaker.record_failure(&config).await;
        assert!(!breaker.allow(&config).await);

        let state = breaker.state(&config).await;
        assert!(state.is_open);
        assert_eq!(state.failure_count, 3);
        assert!(state.cooldown_until.is_some());
    }

    #[tokio::test]
    async fn success_resets_counter_without_closing() {
        let breaker = CircuitBreaker::new();
        let config = channel(3, 300);

        breaker.record_failure(&config).await;
        breaker.record_failure(&config).await;
        breaker.record_success("tg").await;
        assert_eq!(breaker.state(&config).await.failure_count, 0);

        // Three fresh failures still open it.
        for _ in 0..3 {
            breaker.record_failure(&config).await;
        }
        assert!(!breaker.allow(&config).await);

        // Success while open does not close the breaker.
        breaker.record_success("tg").await;
        assert!(!breaker.allow(&config).await);
    }

    #[tokio::test]
    async fn cooldown_closes_and_resets() {
        let breaker = CircuitBreaker::new();
        let config = channel(2, 1);

        breaker.record_failure(&config).await;
        breaker.record_failure(&config).await;
        assert!(!breaker.allow(&config).await);

        sleep(Duration::from_millis(1100)).await;

        assert!(breaker.allow(&config).await);
        let state = breaker.state(&config).await;
        assert!(!state.is_open);
        assert_eq!(state.failure_count, 0);
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let breaker = CircuitBreaker::new();
        let config = channel(1, 300);

        breaker.record_failure(&config).await;
        assert!(!breaker.allow(&config).await);

        breaker.reset("tg").await;
        assert!(breaker.allow(&config).await);
        assert_eq!(breaker.state(&config).await.failure_count, 0);
    }
}
