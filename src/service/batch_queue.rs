// src/service/batch_queue.rs
//! Batch queue for low-priority notifications.
//!
//! Notifications accumulate in an in-memory list; once the list reaches
//! the configured max size (or a caller flushes explicitly) they collapse
//! into one synthetic CUSTOM notification that is routed normally. The
//! queue owns no timer: time-based flushing is a periodic caller
//! responsibility.

use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::domain::model::notification::{
    Notification, NotificationPriority, NotificationType,
};

pub struct BatchQueue {
    queue: Mutex<Vec<Notification>>,
    max_size: usize,
}

impl BatchQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            max_size: max_size.max(1),
        }
    }

    /// Append a notification. When the queue reaches max size the whole
    /// batch is drained and returned so the caller can route it outside
    /// the lock.
    pub async fn push(&self, notification: Notification) -> Option<Vec<Notification>> {
        let mut queue = self.queue.lock().await;
        queue.push(notification);
        if queue.len() >= self.max_size {
            debug!(size = queue.len(), "batch queue full, draining");
            Some(std::mem::take(&mut *queue))
        } else {
            None
        }
    }

    /// Drain whatever is queued; `None` when empty.
    pub async fn drain(&self) -> Option<Vec<Notification>> {
        let mut queue = self.queue.lock().await;
        if queue.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut *queue))
        }
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }

    /// Collapse queued notifications into one synthetic batch notification.
    /// The original ids travel in `data["batched_ids"]`.
    pub fn build_batch(items: &[Notification]) -> Notification {
        let batched_ids: Vec<_> = items.iter().map(|n| n.id.clone()).collect();
        let body: Vec<String> = items
            .iter()
            .map(|n| format!("- {}: {}", n.title, n.message))
            .collect();

        Notification::new(
            NotificationType::Custom,
            format!("Batch Notification ({} items)", items.len()),
            body.join("\n"),
            NotificationPriority::Low,
        )
        .with_id(format!("batch-{}", &Uuid::new_v4().simple().to_string()[..8]))
        .with_data("batched_ids", json!(batched_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn low(title: &str) -> Notification {
        Notification::new(
            NotificationType::BalanceUpdate,
            title,
            "changed",
            NotificationPriority::Low,
        )
    }

    #[tokio::test]
    async fn push_drains_at_max_size() {
        let queue = BatchQueue::new(3);
        assert!(queue.push(low("a")).await.is_none());
        assert!(queue.push(low("b")).await.is_none());

        let batch = queue.push(low("c")).await.unwrap();
        assert_eq!(batch.len(), 3);
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn drain_empty_is_none() {
        let queue = BatchQueue::new(5);
        assert!(queue.drain().await.is_none());

        queue.push(low("a")).await;
        assert_eq!(queue.drain().await.unwrap().len(), 1);
    }

    #[test]
    fn build_batch_carries_original_ids() {
        let items = vec![low("a"), low("b"), low("c")];
        let batch = BatchQueue::build_batch(&items);

        assert_eq!(batch.notification_type, NotificationType::Custom);
        assert_eq!(batch.priority, NotificationPriority::Low);
        assert!(batch.id.starts_with("batch-"));
        assert!(batch.title.contains("3 items"));
        assert!(batch.message.contains("- a: changed"));

        let ids = batch.data.get("batched_ids").unwrap().as_array().unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0].as_str().unwrap(), items[0].id);
    }
}
