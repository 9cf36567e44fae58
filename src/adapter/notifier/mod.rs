// src/adapter/notifier/mod.rs
//! Transport seam between the dispatch core and wire-level senders.
//!
//! The core never talks to a chat API, SMTP server or webhook endpoint
//! directly: it calls a [`Transport`] registered for the channel's type.
//! Real senders live outside this crate; the only in-tree implementation
//! is [`ConsoleTransport`], a print sink for development and tests.

mod console_notifier;

pub use console_notifier::ConsoleTransport;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::model::channel::ChannelConfig;
use crate::domain::model::notification::Notification;

/// Transport failure classification.
///
/// Everything except `NonRetryable` is treated as transient and retried
/// under the channel's retry policy. A per-attempt timeout is mapped to
/// `Transient` by the retry sender.
#[derive(Debug, Error)]
pub enum SendError {
    /// Permanent failure (bad credentials, deleted endpoint). Short-circuits
    /// the retry loop regardless of remaining budget.
    #[error("non-retryable: {0}")]
    NonRetryable(String),

    /// Transient failure; eligible for retry with backoff.
    #[error("{0}")]
    Transient(String),
}

impl SendError {
    pub fn transient(msg: impl Into<String>) -> Self {
        SendError::Transient(msg.into())
    }

    pub fn non_retryable(msg: impl Into<String>) -> Self {
        SendError::NonRetryable(msg.into())
    }
}

/// Wire-level sender for one channel type.
///
/// Implementations must be cheap to share (`Arc<dyn Transport>`) and safe
/// to call concurrently for different channels of the same type.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `notification` to the endpoint described by `channel`.
    async fn send(&self, channel: &ChannelConfig, notification: &Notification)
        -> Result<(), SendError>;
}
