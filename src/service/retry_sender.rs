// src/service/retry_sender.rs
//! Single-channel delivery with bounded retries and exponential backoff.
//!
//! Responsibilities:
//! - Run at most `retry_count + 1` transport attempts per delivery.
//! - Back off `retry_delay * 2^attempt` between attempts (no jitter).
//! - Bound every attempt with the channel's per-attempt send timeout;
//!   a timeout counts as a transient, retryable failure.
//! - Short-circuit on `SendError::NonRetryable`.
//! - Feed every attempt outcome into the channel's circuit breaker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::time::{sleep, timeout};
use tracing::{debug, error};

use crate::adapter::notifier::{SendError, Transport};
use crate::domain::model::channel::ChannelConfig;
use crate::domain::model::delivery::ChannelResult;
use crate::domain::model::notification::Notification;
use crate::service::circuit_breaker::CircuitBreaker;

pub struct RetrySender {
    /// Channel name -> transport, resolved at channel registration.
    bound: RwLock<HashMap<String, Arc<dyn Transport>>>,
    breaker: Arc<CircuitBreaker>,
}

impl RetrySender {
    pub fn new(breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            bound: RwLock::new(HashMap::new()),
            breaker,
        }
    }

    /// Bind the transport a channel will use. Called once per registration.
    pub async fn bind(&self, channel_name: &str, transport: Arc<dyn Transport>) {
        self.bound
            .write()
            .await
            .insert(channel_name.to_string(), transport);
    }

    fn backoff_delay(config: &ChannelConfig, attempt: u32) -> Duration {
        Duration::from_secs_f64(config.retry_delay_seconds.max(0.0) * 2f64.powi(attempt as i32))
    }

    /// Deliver with the channel's retry policy. Never returns an error:
    /// the outcome, good or bad, is a `ChannelResult`.
    pub async fn send_with_retry(
        &self,
        config: &ChannelConfig,
        notification: &Notification,
    ) -> ChannelResult {
        let transport = match self.bound.read().await.get(&config.name) {
            Some(t) => Arc::clone(t),
            None => {
                // Registration validates transports, so this only happens if
                // a channel was re-registered with a type that lost its
                // transport. Treated as a permanent failure.
                error!(channel = %config.name, "no transport bound for channel");
                return ChannelResult::failure(&config.name, "no transport bound", 0.0, 0);
            }
        };

        let start = Instant::now();
        let mut last_error = String::from("send failed");
        let mut retries: u32 = 0;

        for attempt in 0..=config.retry_count {
            let outcome = timeout(
                config.send_timeout(),
                transport.send(config, notification),
            )
            .await;

            let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

            match outcome {
                Ok(Ok(())) => {
                    self.breaker.record_success(&config.name).await;
                    return ChannelResult::success(&config.name, latency_ms, attempt);
                }
                Ok(Err(SendError::NonRetryable(msg))) => {
                    self.breaker.record_failure(config).await;
                    debug!(channel = %config.name, error = %msg, "non-retryable send failure");
                    return ChannelResult::failure(&config.name, msg, latency_ms, 0);
                }
                Ok(Err(SendError::Transient(msg))) => {
                    last_error = msg;
                }
                Err(_) => {
                    last_error = format!(
                        "send timed out after {}s",
                        config.send_timeout_seconds
                    );
                }
            }

            retries += 1;
            self.breaker.record_failure(config).await;
            debug!(
                channel = %config.name,
                attempt,
                error = %last_error,
                "send attempt failed"
            );

            if attempt < config.retry_count {
                sleep(Self::backoff_delay(config, attempt)).await;
            }
        }

        error!(
            channel = %config.name,
            notification_id = %notification.id,
            attempts = retries,
            error = %last_error,
            "delivery failed after exhausting retries"
        );
        ChannelResult::failure(
            &config.name,
            last_error,
            start.elapsed().as_secs_f64() * 1000.0,
            retries,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::channel::ChannelType;
    use crate::domain::model::notification::{NotificationPriority, NotificationType};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedTransport {
        calls: AtomicU32,
        fail_first: u32,
        non_retryable: bool,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(
            &self,
            _channel: &ChannelConfig,
            _notification: &Notification,
        ) -> Result<(), SendError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.non_retryable {
                return Err(SendError::non_retryable("bad credentials"));
            }
            if call < self.fail_first {
                Err(SendError::transient("connection reset"))
            } else {
                Ok(())
            }
        }
    }

    struct SlowTransport;

    #[async_trait]
    impl Transport for SlowTransport {
        async fn send(
            &self,
            _channel: &ChannelConfig,
            _notification: &Notification,
        ) -> Result<(), SendError> {
            sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    fn channel(retry_count: u32) -> ChannelConfig {
        ChannelConfig::new(ChannelType::Webhook, "hook", "http://example")
            .with_retries(retry_count, 0.01)
    }

    fn notification() -> Notification {
        Notification::new(
            NotificationType::TradeExecuted,
            "fill",
            "bought 1 BTC",
            NotificationPriority::Medium,
        )
    }

    async fn sender_with(transport: Arc<dyn Transport>) -> RetrySender {
        let sender = RetrySender::new(Arc::new(CircuitBreaker::new()));
        sender.bind("hook", transport).await;
        sender
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let transport = Arc::new(ScriptedTransport {
            calls: AtomicU32::new(0),
            fail_first: 2,
            non_retryable: false,
        });
        let sender = sender_with(transport.clone()).await;

        let result = sender.send_with_retry(&channel(3), &notification()).await;
        assert!(result.success);
        assert_eq!(result.retry_count, 2);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_retry_budget() {
        let transport = Arc::new(ScriptedTransport {
            calls: AtomicU32::new(0),
            fail_first: u32::MAX,
            non_retryable: false,
        });
        let sender = sender_with(transport.clone()).await;

        let result = sender.send_with_retry(&channel(2), &notification()).await;
        assert!(!result.success);
        assert_eq!(result.retry_count, 3);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.error.as_deref(), Some("connection reset"));
    }

    #[tokio::test]
    async fn non_retryable_short_circuits() {
        let transport = Arc::new(ScriptedTransport {
            calls: AtomicU32::new(0),
            fail_first: 0,
            non_retryable: true,
        });
        let sender = sender_with(transport.clone()).await;

        let result = sender.send_with_retry(&channel(5), &notification()).await;
        assert!(!result.success);
        assert_eq!(result.retry_count, 0);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.error.as_deref(), Some("bad credentials"));
    }

    #[tokio::test]
    async fn attempt_timeout_is_retryable() {
        let sender = sender_with(Arc::new(SlowTransport)).await;
        let config = channel(1).with_send_timeout(1);

        let result = sender.send_with_retry(&config, &notification()).await;
        assert!(!result.success);
        assert_eq!(result.retry_count, 2);
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn unbound_channel_fails_without_retry() {
        let sender = RetrySender::new(Arc::new(CircuitBreaker::new()));
        let result = sender.send_with_retry(&channel(3), &notification()).await;
        assert!(!result.success);
        assert_eq!(result.retry_count, 0);
    }
}
