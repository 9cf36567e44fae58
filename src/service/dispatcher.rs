// src/service/dispatcher.rs
//! Notification dispatcher facade
//!
//! Responsibilities:
//! - Own every piece of routing state: channel registry, routing engine,
//!   rate limiter, circuit breakers, retry sender, delivery tracker and
//!   batch queue. One dispatcher per process, shared by `Arc`.
//! - `route()`: per target channel, circuit breaker -> rate limiter ->
//!   retry sender, in that order, short-circuiting without a transport
//!   call when a gate rejects.
//! - `queue()` / `flush_batch()`: the low-priority batching path.
//! - Monotonic statistics, global and per channel.
//!
//! Each sub-structure guards its own state; no operation holds two locks
//! at once, so the per-channel loop cannot deadlock.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::adapter::notifier::Transport;
use crate::config::DispatcherConfig;
use crate::domain::error::DispatchError;
use crate::domain::model::channel::{ChannelConfig, ChannelType};
use crate::domain::model::delivery::{ChannelResult, DeliveryRecord, DeliveryStatus, RouteResult};
use crate::domain::model::notification::{Notification, NotificationPriority};
use crate::domain::model::rule::RoutingRule;
use crate::service::batch_queue::BatchQueue;
use crate::service::channel_registry::ChannelRegistry;
use crate::service::circuit_breaker::{CircuitBreaker, CircuitBreakerState};
use crate::service::delivery_tracker::DeliveryTracker;
use crate::service::rate_limiter::RateLimiter;
use crate::service::retry_sender::RetrySender;
use crate::service::routing_engine::RoutingEngine;

/// Per-channel delivery counters. Monotonic for the process lifetime.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelCounters {
    pub sent: u64,
    pub failed: u64,
    pub rate_limited: u64,
    pub total_latency_ms: f64,
}

/// Global dispatcher counters plus the per-channel breakdown.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouterStatistics {
    pub total_notifications: u64,
    pub total_delivered: u64,
    pub total_failed: u64,
    pub total_rate_limited: u64,
    pub channels: HashMap<String, ChannelCounters>,
}

/// Snapshot answer for `get_channel_statistics`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelStatistics {
    pub sent: u64,
    pub failed: u64,
    pub rate_limited: u64,
    pub total_latency_ms: f64,
    pub avg_latency_ms: f64,
}

pub struct Dispatcher {
    config: DispatcherConfig,
    registry: Arc<ChannelRegistry>,
    routing: RoutingEngine,
    limiter: RateLimiter,
    breaker: Arc<CircuitBreaker>,
    sender: RetrySender,
    tracker: DeliveryTracker,
    batch: BatchQueue,
    /// Channel type -> wire-level sender. Resolved per channel at
    /// registration time.
    transports: RwLock<HashMap<ChannelType, Arc<dyn Transport>>>,
    stats: Mutex<RouterStatistics>,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        let registry = Arc::new(ChannelRegistry::new());
        let breaker = Arc::new(CircuitBreaker::new());
        Self {
            routing: RoutingEngine::new(Arc::clone(&registry)),
            limiter: RateLimiter::new(),
            sender: RetrySender::new(Arc::clone(&breaker)),
            tracker: DeliveryTracker::new(),
            batch: BatchQueue::new(config.batch_max_size),
            registry,
            breaker,
            transports: RwLock::new(HashMap::new()),
            stats: Mutex::new(RouterStatistics::default()),
            config,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Register the transport used by every channel of `channel_type`.
    pub async fn register_transport(
        &self,
        channel_type: ChannelType,
        transport: Arc<dyn Transport>,
    ) {
        info!(%channel_type, "transport registered");
        self.transports.write().await.insert(channel_type, transport);
    }

    /// Register (or replace) a channel. Requires a transport for the
    /// channel's type; resets the channel's rate-limit window, breaker
    /// state and statistics counters.
    pub async fn register_channel(
        &self,
        config: ChannelConfig,
    ) -> Result<ChannelConfig, DispatchError> {
        if config.name.is_empty() {
            return Err(DispatchError::InvalidChannelConfig {
                name: config.name.clone(),
                reason: "channel name must not be empty".to_string(),
            });
        }
        let transport = self
            .transports
            .read()
            .await
            .get(&config.channel_type)
            .cloned()
            .ok_or(DispatchError::TransportMissing(config.channel_type))?;

        let stored = self.registry.register(config).await;
        self.sender.bind(&stored.name, transport).await;
        self.limiter.reset(&stored.name).await;
        self.breaker.reset(&stored.name).await;
        self.stats
            .lock()
            .await
            .channels
            .insert(stored.name.clone(), ChannelCounters::default());
        Ok(stored)
    }

    pub async fn get_channel(&self, name: &str) -> Option<ChannelConfig> {
        self.registry.get(name).await
    }

    pub async fn enable_channel(&self, name: &str) -> Result<(), DispatchError> {
        if self.registry.enable(name).await {
            Ok(())
        } else {
            Err(DispatchError::UnknownChannel(name.to_string()))
        }
    }

    pub async fn disable_channel(&self, name: &str) -> Result<(), DispatchError> {
        if self.registry.disable(name).await {
            Ok(())
        } else {
            Err(DispatchError::UnknownChannel(name.to_string()))
        }
    }

    /// Append a routing rule; returns a copy of the stored rule.
    pub async fn add_routing_rule(&self, rule: RoutingRule) -> RoutingRule {
        self.routing.add_rule(rule.clone()).await;
        rule
    }

    /// Route a notification to every eligible channel and record the
    /// outcome. Never fails for per-channel errors; an empty result means
    /// no channel was eligible.
    pub async fn route(&self, notification: &Notification) -> RouteResult {
        self.stats.lock().await.total_notifications += 1;

        let targets = self.routing.target_channels(notification).await;
        if targets.is_empty() {
            debug!(notification_id = %notification.id, "no eligible channels");
            return RouteResult::empty(&notification.id);
        }

        self.tracker.begin(notification).await;

        let mut sent = 0usize;
        let mut failed = 0usize;
        let mut limited = 0usize;

        for config in &targets {
            let result = self.deliver_to_channel(config, notification).await;
            if result.success {
                sent += 1;
            } else if result.rate_limited {
                limited += 1;
            } else {
                failed += 1;
            }
            self.tracker.record(&notification.id, result).await;
        }

        let record = self.tracker.finalize(&notification.id, targets.len()).await;
        if let Some(record) = &record {
            self.bump_totals(record.status).await;
        }

        RouteResult {
            notification_id: notification.id.clone(),
            channels_sent: sent,
            channels_failed: failed,
            channels_rate_limited: limited,
            delivery_record: record,
        }
    }

    /// One channel's delivery: breaker gate, rate-limit gate, then the
    /// retry sender. Per-channel counters are updated here.
    async fn deliver_to_channel(
        &self,
        config: &ChannelConfig,
        notification: &Notification,
    ) -> ChannelResult {
        if !self.breaker.allow(config).await {
            debug!(channel = %config.name, "rejected by open circuit breaker");
            return ChannelResult::circuit_open(&config.name);
        }

        if !self.limiter.try_admit(config).await {
            let mut stats = self.stats.lock().await;
            stats.channels.entry(config.name.clone()).or_default().rate_limited += 1;
            return ChannelResult::rate_limited(&config.name);
        }

        let result = self.sender.send_with_retry(config, notification).await;

        let mut stats = self.stats.lock().await;
        let counters = stats.channels.entry(config.name.clone()).or_default();
        if result.success {
            counters.sent += 1;
            counters.total_latency_ms += result.latency_ms;
        } else {
            counters.failed += 1;
        }
        result
    }

    async fn bump_totals(&self, status: DeliveryStatus) {
        let mut stats = self.stats.lock().await;
        match status {
            DeliveryStatus::Delivered | DeliveryStatus::Partial => stats.total_delivered += 1,
            DeliveryStatus::RateLimited => stats.total_rate_limited += 1,
            DeliveryStatus::Failed => stats.total_failed += 1,
            DeliveryStatus::Pending => {}
        }
    }

    /// Queue a notification for batched delivery. HIGH and CRITICAL
    /// notifications bypass the queue and are routed immediately; a full
    /// queue is flushed inline. Returns the route result whenever a route
    /// actually happened.
    pub async fn queue(&self, notification: Notification) -> Option<RouteResult> {
        if notification.priority >= NotificationPriority::High {
            return Some(self.route(&notification).await);
        }

        if let Some(items) = self.batch.push(notification).await {
            let batch = BatchQueue::build_batch(&items);
            return Some(self.route(&batch).await);
        }
        None
    }

    /// Flush queued notifications as a single synthetic batch. `None`
    /// when the queue is empty. Call this periodically for time-based
    /// flushing; the dispatcher owns no timer.
    pub async fn flush_batch(&self) -> Option<RouteResult> {
        let items = self.batch.drain().await?;
        let batch = BatchQueue::build_batch(&items);
        Some(self.route(&batch).await)
    }

    pub async fn batch_len(&self) -> usize {
        self.batch.len().await
    }

    /// Re-attempt only the channels whose last recorded result was
    /// unsuccessful, updating the existing record in place. Disabled
    /// channels are skipped; gates apply as in `route()`.
    pub async fn retry_failed(
        &self,
        notification_id: &str,
    ) -> Result<RouteResult, DispatchError> {
        let notification = self
            .tracker
            .notification(notification_id)
            .await
            .ok_or_else(|| DispatchError::UnknownNotification(notification_id.to_string()))?;

        let mut sent = 0usize;
        let mut failed = 0usize;
        let mut limited = 0usize;

        for name in self.tracker.failed_channels(notification_id).await {
            let Some(config) = self.registry.get(&name).await else {
                continue;
            };
            if !config.enabled {
                continue;
            }
            let result = self.deliver_to_channel(&config, &notification).await;
            if result.success {
                sent += 1;
            } else if result.rate_limited {
                limited += 1;
            } else {
                failed += 1;
            }
            self.tracker.record(notification_id, result).await;
        }

        // Recompute the status over every channel the record knows about.
        let record = self.tracker.get(notification_id).await.ok_or_else(|| {
            DispatchError::UnknownNotification(notification_id.to_string())
        })?;
        let target_count = record.channel_results.len();
        let record = self.tracker.finalize(notification_id, target_count).await;

        Ok(RouteResult {
            notification_id: notification_id.to_string(),
            channels_sent: sent,
            channels_failed: failed,
            channels_rate_limited: limited,
            delivery_record: record,
        })
    }

    pub async fn get_delivery_status(&self, notification_id: &str) -> Option<DeliveryRecord> {
        self.tracker.get(notification_id).await
    }

    pub async fn get_statistics(&self) -> RouterStatistics {
        self.stats.lock().await.clone()
    }

    /// Zeroed statistics for unknown channels, matching the registry's
    /// never-delete lifecycle.
    pub async fn get_channel_statistics(&self, name: &str) -> ChannelStatistics {
        let stats = self.stats.lock().await;
        let counters = stats.channels.get(name).cloned().unwrap_or_default();
        let avg_latency_ms = if counters.sent > 0 {
            counters.total_latency_ms / counters.sent as f64
        } else {
            0.0
        };
        ChannelStatistics {
            sent: counters.sent,
            failed: counters.failed,
            rate_limited: counters.rate_limited,
            total_latency_ms: counters.total_latency_ms,
            avg_latency_ms,
        }
    }

    pub async fn circuit_breaker_state(
        &self,
        name: &str,
    ) -> Result<CircuitBreakerState, DispatchError> {
        let config = self
            .registry
            .get(name)
            .await
            .ok_or_else(|| DispatchError::UnknownChannel(name.to_string()))?;
        Ok(self.breaker.state(&config).await)
    }

    /// Administrative/testing hook: clear a channel's rate-limit window.
    pub async fn reset_rate_limit(&self, name: &str) {
        self.limiter.reset(name).await;
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}
