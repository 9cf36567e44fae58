// src/domain/model/delivery.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Overall delivery status of one notification across all targeted channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// Record created, not all channel results in yet.
    Pending,
    /// Every targeted channel succeeded.
    Delivered,
    /// At least one success and at least one failure.
    Partial,
    /// Every targeted channel failed, not all of them by rate limiting.
    Failed,
    /// Every targeted channel was rejected by its rate limiter.
    RateLimited,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Partial => "partial",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::RateLimited => "rate_limited",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of delivering one notification to one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelResult {
    pub channel_name: String,
    pub success: bool,
    pub error: Option<String>,
    /// True only for rate-limiter gate rejections; lets the tracker
    /// classify an all-rate-limited outcome without parsing error text.
    pub rate_limited: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub latency_ms: f64,
    /// Failed attempts consumed before this result (0 on first-try success).
    pub retry_count: u32,
}

impl ChannelResult {
    pub fn success(channel_name: impl Into<String>, latency_ms: f64, retry_count: u32) -> Self {
        Self {
            channel_name: channel_name.into(),
            success: true,
            error: None,
            rate_limited: false,
            sent_at: Some(Utc::now()),
            latency_ms,
            retry_count,
        }
    }

    pub fn failure(
        channel_name: impl Into<String>,
        error: impl Into<String>,
        latency_ms: f64,
        retry_count: u32,
    ) -> Self {
        Self {
            channel_name: channel_name.into(),
            success: false,
            error: Some(error.into()),
            rate_limited: false,
            sent_at: None,
            latency_ms,
            retry_count,
        }
    }

    /// Gate rejection by the rate limiter; no transport attempt occurred.
    pub fn rate_limited(channel_name: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            success: false,
            error: Some("rate limited".to_string()),
            rate_limited: true,
            sent_at: None,
            latency_ms: 0.0,
            retry_count: 0,
        }
    }

    /// Gate rejection by an open circuit breaker; no transport attempt occurred.
    pub fn circuit_open(channel_name: impl Into<String>) -> Self {
        Self::failure(channel_name, "circuit breaker open", 0.0, 0)
    }
}

/// Delivery ledger for one notification id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub notification_id: String,
    pub status: DeliveryStatus,
    /// Channel name -> latest result for that channel.
    pub channel_results: HashMap<String, ChannelResult>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Max retries consumed by any single channel.
    pub retry_count: u32,
}

/// Aggregate outcome returned by `Dispatcher::route`.
///
/// All counters zero with no record means no channel was eligible,
/// which is distinct from "all eligible channels failed".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResult {
    pub notification_id: String,
    pub channels_sent: usize,
    pub channels_failed: usize,
    pub channels_rate_limited: usize,
    pub delivery_record: Option<DeliveryRecord>,
}

impl RouteResult {
    pub fn empty(notification_id: impl Into<String>) -> Self {
        Self {
            notification_id: notification_id.into(),
            channels_sent: 0,
            channels_failed: 0,
            channels_rate_limited: 0,
            delivery_record: None,
        }
    }
}
