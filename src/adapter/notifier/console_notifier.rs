// src/adapter/notifier/console_notifier.rs

use async_trait::async_trait;
use tracing::info;

use crate::adapter::notifier::{SendError, Transport};
use crate::domain::model::channel::ChannelConfig;
use crate::domain::model::notification::Notification;

/// Transport that writes notifications to the process log.
///
/// Useful as a development sink and as the default target for the
/// `Console` channel type. Never fails.
#[derive(Debug, Default)]
pub struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send(
        &self,
        channel: &ChannelConfig,
        notification: &Notification,
    ) -> Result<(), SendError> {
        info!(
            channel = %channel.name,
            priority = %notification.priority,
            "[{}] {}: {}",
            notification.priority,
            notification.title,
            notification.message
        );
        Ok(())
    }
}
