// src/domain/model/rule.rs

use std::fmt;
use std::sync::Arc;

use crate::domain::model::notification::{Notification, NotificationPriority, NotificationType};

/// Opaque extra match condition evaluated against the notification.
pub type RuleCondition = Arc<dyn Fn(&Notification) -> bool + Send + Sync>;

/// Static mapping from a notification type to candidate channels.
///
/// Multiple rules may target the same type; their channel sets union.
#[derive(Clone)]
pub struct RoutingRule {
    pub notification_type: NotificationType,
    /// Channel names this rule makes eligible.
    pub channels: Vec<String>,
    /// Rule-level priority floor; overrides nothing, just filters this rule.
    pub min_priority: Option<NotificationPriority>,
    /// Optional predicate; `None` always matches.
    pub condition: Option<RuleCondition>,
}

impl RoutingRule {
    pub fn new(notification_type: NotificationType, channels: Vec<String>) -> Self {
        Self {
            notification_type,
            channels,
            min_priority: None,
            condition: None,
        }
    }

    pub fn with_min_priority(mut self, min_priority: NotificationPriority) -> Self {
        self.min_priority = Some(min_priority);
        self
    }

    pub fn with_condition(mut self, condition: RuleCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Whether this rule applies to the given notification.
    pub fn matches(&self, notification: &Notification) -> bool {
        if self.notification_type != notification.notification_type {
            return false;
        }
        if let Some(min) = self.min_priority {
            if notification.priority < min {
                return false;
            }
        }
        if let Some(cond) = &self.condition {
            if !cond(notification) {
                return false;
            }
        }
        true
    }
}

impl fmt::Debug for RoutingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingRule")
            .field("notification_type", &self.notification_type)
            .field("channels", &self.channels)
            .field("min_priority", &self.min_priority)
            .field("condition", &self.condition.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
