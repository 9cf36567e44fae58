// src/service/routing_engine.rs
//! Routing engine service
//!
//! Responsibilities:
//! - Map a notification's type and priority to the set of eligible channels.
//! - Union the channel sets of every matching rule, then filter by each
//!   channel's enabled flag and minimum priority.
//! - Produce a deterministic result for identical inputs (channels are
//!   deduplicated and ordered by name).

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::model::channel::ChannelConfig;
use crate::domain::model::notification::{Notification, NotificationType};
use crate::domain::model::rule::RoutingRule;
use crate::service::channel_registry::ChannelRegistry;

pub struct RoutingEngine {
    rules: RwLock<HashMap<NotificationType, Vec<RoutingRule>>>,
    registry: Arc<ChannelRegistry>,
}

impl RoutingEngine {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
            registry,
        }
    }

    /// Append a rule for its notification type.
    pub async fn add_rule(&self, rule: RoutingRule) {
        debug!(
            notification_type = %rule.notification_type,
            channels = ?rule.channels,
            "routing rule added"
        );
        self.rules
            .write()
            .await
            .entry(rule.notification_type)
            .or_default()
            .push(rule);
    }

    pub async fn rules_for(&self, notification_type: NotificationType) -> Vec<RoutingRule> {
        self.rules
            .read()
            .await
            .get(&notification_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Eligible channels for a notification, deduplicated by name and
    /// ordered by name for run-to-run stability.
    pub async fn target_channels(&self, notification: &Notification) -> Vec<ChannelConfig> {
        let mut candidates: BTreeSet<String> = BTreeSet::new();
        {
            let rules = self.rules.read().await;
            if let Some(rules) = rules.get(&notification.notification_type) {
                for rule in rules {
                    if rule.matches(notification) {
                        candidates.extend(rule.channels.iter().cloned());
                    }
                }
            }
        }

        let mut targets = Vec::with_capacity(candidates.len());
        for name in candidates {
            if let Some(config) = self.registry.get(&name).await {
                if config.enabled && notification.priority >= config.min_priority {
                    targets.push(config);
                }
            }
        }

        debug!(
            notification_id = %notification.id,
            targets = targets.len(),
            "routing decision"
        );
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::channel::ChannelType;
    use crate::domain::model::notification::NotificationPriority;

    async fn registry_with(names: &[(&str, NotificationPriority)]) -> Arc<ChannelRegistry> {
        let registry = Arc::new(ChannelRegistry::new());
        for (name, min_priority) in names {
            registry
                .register(
                    ChannelConfig::new(ChannelType::Webhook, *name, "http://example")
                        .with_min_priority(*min_priority),
                )
                .await;
        }
        registry
    }

    #[tokio::test]
    async fn channel_min_priority_filters_targets() {
        let registry = registry_with(&[
            ("all", NotificationPriority::Low),
            ("pager", NotificationPriority::High),
        ])
        .await;
        let engine = RoutingEngine::new(registry);
        engine
            .add_rule(RoutingRule::new(
                NotificationType::PriceAlert,
                vec!["all".into(), "pager".into()],
            ))
            .await;

        let medium = Notification::new(
            NotificationType::PriceAlert,
            "BTC",
            "moved",
            NotificationPriority::Medium,
        );
        let targets = engine.target_channels(&medium).await;
        let names: Vec<_> = targets.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["all"]);

        let critical = Notification::new(
            NotificationType::PriceAlert,
            "BTC",
            "crashed",
            NotificationPriority::Critical,
        );
        assert_eq!(engine.target_channels(&critical).await.len(), 2);
    }

    #[tokio::test]
    async fn overlapping_rules_dedup_by_name() {
        let registry = registry_with(&[("ops", NotificationPriority::Low)]).await;
        let engine = RoutingEngine::new(registry);
        engine
            .add_rule(RoutingRule::new(NotificationType::SystemError, vec!["ops".into()]))
            .await;
        engine
            .add_rule(RoutingRule::new(NotificationType::SystemError, vec!["ops".into()]))
            .await;

        let n = Notification::new(
            NotificationType::SystemError,
            "oops",
            "boom",
            NotificationPriority::High,
        );
        assert_eq!(engine.target_channels(&n).await.len(), 1);
    }

    #[tokio::test]
    async fn rule_min_priority_and_disabled_channels() {
        let registry = registry_with(&[("ops", NotificationPriority::Low)]).await;
        let engine = RoutingEngine::new(registry.clone());
        engine
            .add_rule(
                RoutingRule::new(NotificationType::RiskWarning, vec!["ops".into()])
                    .with_min_priority(NotificationPriority::High),
            )
            .await;

        let low = Notification::new(
            NotificationType::RiskWarning,
            "margin",
            "tight",
            NotificationPriority::Low,
        );
        assert!(engine.target_channels(&low).await.is_empty());

        let high = Notification::new(
            NotificationType::RiskWarning,
            "margin",
            "call",
            NotificationPriority::High,
        );
        assert_eq!(engine.target_channels(&high).await.len(), 1);

        registry.disable("ops").await;
        assert!(engine.target_channels(&high).await.is_empty());
    }
}
