// src/domain/model/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Priority of a notification.
///
/// The derived `Ord` gives `Low < Medium < High < Critical`, which the
/// routing engine relies on for min-priority threshold filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationPriority::Low => write!(f, "LOW"),
            NotificationPriority::Medium => write!(f, "MEDIUM"),
            NotificationPriority::High => write!(f, "HIGH"),
            NotificationPriority::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Semantic type of a notification. Routing rules are keyed by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationType {
    TradeExecuted,
    PriceAlert,
    PositionUpdate,
    RiskWarning,
    SystemError,
    BalanceUpdate,
    WhaleAlert,
    NewsAlert,
    Custom,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationType::TradeExecuted => "trade_executed",
            NotificationType::PriceAlert => "price_alert",
            NotificationType::PositionUpdate => "position_update",
            NotificationType::RiskWarning => "risk_warning",
            NotificationType::SystemError => "system_error",
            NotificationType::BalanceUpdate => "balance_update",
            NotificationType::WhaleAlert => "whale_alert",
            NotificationType::NewsAlert => "news_alert",
            NotificationType::Custom => "custom",
        };
        write!(f, "{}", s)
    }
}

/// A notification to be routed. Immutable once handed to the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique id, used as the delivery-record key.
    pub id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    /// Structured payload for channel-specific rendering.
    /// `BTreeMap` keeps serialization order deterministic.
    pub data: BTreeMap<String, JsonValue>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a notification with a fresh v4 uuid and the current timestamp.
    pub fn new(
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        priority: NotificationPriority,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            notification_type,
            title: title.into(),
            message: message.into(),
            priority,
            data: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}
