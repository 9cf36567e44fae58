// src/service/rate_limiter.rs
//! Per-channel sliding-window rate limiter.
//!
//! Each channel keeps the timestamps of admitted requests within the
//! trailing 60 seconds. A request is admitted only while the pruned window
//! holds fewer entries than the channel's `rate_limit_per_minute`;
//! a rejected request leaves the window untouched.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::model::channel::ChannelConfig;

const WINDOW_SECONDS: i64 = 60;

#[derive(Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to admit one request for the channel. Prunes expired entries,
    /// then either records `now` and returns true, or returns false with
    /// no side effect.
    pub async fn try_admit(&self, config: &ChannelConfig) -> bool {
        let now = Utc::now();
        let cutoff = now - ChronoDuration::seconds(WINDOW_SECONDS);

        let mut windows = self.windows.lock().await;
        let window = windows.entry(config.name.clone()).or_default();
        window.retain(|t| *t > cutoff);

        if window.len() >= config.rate_limit_per_minute as usize {
            warn!(
                channel = %config.name,
                limit = config.rate_limit_per_minute,
                "rate limit exceeded"
            );
            return false;
        }

        window.push(now);
        true
    }

    /// Clear the channel's window. Administrative/testing hook.
    pub async fn reset(&self, channel_name: &str) {
        self.windows
            .lock()
            .await
            .insert(channel_name.to_string(), Vec::new());
    }

    /// Admitted requests currently inside the window.
    pub async fn current_count(&self, channel_name: &str) -> usize {
        let cutoff = Utc::now() - ChronoDuration::seconds(WINDOW_SECONDS);
        self.windows
            .lock()
            .await
            .get(channel_name)
            .map(|w| w.iter().filter(|t| **t > cutoff).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::channel::ChannelType;

    fn channel(limit: u32) -> ChannelConfig {
        ChannelConfig::new(ChannelType::Webhook, "ops", "http://example").with_rate_limit(limit)
    }

    #[tokio::test]
    async fn admits_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new();
        let config = channel(3);

        for _ in 0..3 {
            assert!(limiter.try_admit(&config).await);
        }
        assert!(!limiter.try_admit(&config).await);
        // Rejection must not consume window space.
        assert_eq!(limiter.current_count("ops").await, 3);
    }

    #[tokio::test]
    async fn reset_clears_window() {
        let limiter = RateLimiter::new();
        let config = channel(1);

        assert!(limiter.try_admit(&config).await);
        assert!(!limiter.try_admit(&config).await);

        limiter.reset("ops").await;
        assert!(limiter.try_admit(&config).await);
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let limiter = RateLimiter::new();
        let a = channel(1);
        let mut b = channel(1);
        b.name = "other".to_string();

        assert!(limiter.try_admit(&a).await);
        assert!(limiter.try_admit(&b).await);
        assert!(!limiter.try_admit(&a).await);
    }
}
