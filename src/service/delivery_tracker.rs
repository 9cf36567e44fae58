// src/service/delivery_tracker.rs
//! Delivery tracking service
//!
//! Responsibilities:
//! - Keep one `DeliveryRecord` per notification id, queryable for the
//!   process lifetime.
//! - Aggregate per-channel results into an overall `DeliveryStatus` once
//!   every targeted channel has reported.
//! - Retain the original notification so failed channels can be retried
//!   against the same record later.
//!
//! Records live in an in-memory map and are never evicted: any routed
//! notification stays queryable until the process exits. Swapping the map
//! for an external store would be an operational change, not a semantic
//! one.

use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::model::delivery::{ChannelResult, DeliveryRecord, DeliveryStatus};
use crate::domain::model::notification::Notification;

struct TrackedDelivery {
    notification: Notification,
    record: DeliveryRecord,
}

#[derive(Default)]
pub struct DeliveryTracker {
    deliveries: RwLock<HashMap<String, TrackedDelivery>>,
}

impl DeliveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending record for the notification if none exists.
    pub async fn begin(&self, notification: &Notification) {
        let mut deliveries = self.deliveries.write().await;
        deliveries
            .entry(notification.id.clone())
            .or_insert_with(|| TrackedDelivery {
                notification: notification.clone(),
                record: DeliveryRecord {
                    notification_id: notification.id.clone(),
                    status: DeliveryStatus::Pending,
                    channel_results: HashMap::new(),
                    created_at: notification.created_at,
                    completed_at: None,
                    retry_count: 0,
                },
            });
    }

    /// Insert or overwrite the channel's result on the record.
    pub async fn record(&self, notification_id: &str, result: ChannelResult) {
        let mut deliveries = self.deliveries.write().await;
        if let Some(tracked) = deliveries.get_mut(notification_id) {
            tracked
                .record
                .channel_results
                .insert(result.channel_name.clone(), result);
        }
    }

    /// Compute the overall status over all recorded channel results and
    /// stamp `completed_at`. Must only run once every one of the
    /// `target_count` channels has a recorded result.
    ///
    /// The RATE_LIMITED classification requires every failure to be a
    /// rate-limit rejection; a mix of rate-limited and other failures with
    /// zero successes is plain FAILED.
    pub async fn finalize(
        &self,
        notification_id: &str,
        target_count: usize,
    ) -> Option<DeliveryRecord> {
        let mut deliveries = self.deliveries.write().await;
        let tracked = deliveries.get_mut(notification_id)?;

        let results = &tracked.record.channel_results;
        let sent = results.values().filter(|r| r.success).count();
        let limited = results.values().filter(|r| r.rate_limited).count();

        tracked.record.status = if target_count > 0 && sent == target_count {
            DeliveryStatus::Delivered
        } else if sent > 0 {
            DeliveryStatus::Partial
        } else if target_count > 0 && limited == target_count {
            DeliveryStatus::RateLimited
        } else {
            DeliveryStatus::Failed
        };
        tracked.record.retry_count = results.values().map(|r| r.retry_count).max().unwrap_or(0);
        tracked.record.completed_at = Some(Utc::now());

        Some(tracked.record.clone())
    }

    pub async fn get(&self, notification_id: &str) -> Option<DeliveryRecord> {
        self.deliveries
            .read()
            .await
            .get(notification_id)
            .map(|t| t.record.clone())
    }

    /// The notification a record was created for, needed to re-send.
    pub async fn notification(&self, notification_id: &str) -> Option<Notification> {
        self.deliveries
            .read()
            .await
            .get(notification_id)
            .map(|t| t.notification.clone())
    }

    /// Names of channels whose latest result was unsuccessful.
    pub async fn failed_channels(&self, notification_id: &str) -> Vec<String> {
        self.deliveries
            .read()
            .await
            .get(notification_id)
            .map(|t| {
                t.record
                    .channel_results
                    .values()
                    .filter(|r| !r.success)
                    .map(|r| r.channel_name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
