// src/lib.rs
//! Multi-channel notification dispatch core.
//!
//! Responsibilities:
//! - Route notifications to configured channels based on type and priority.
//! - Enforce per-channel rate limits (sliding 60s window).
//! - Protect failing channels with per-channel circuit breakers.
//! - Retry transient failures with exponential backoff.
//! - Batch low-priority notifications into a single synthetic delivery.
//! - Track the delivery outcome of every notification for the process lifetime.
//!
//! The crate is transport-agnostic: wire-level senders implement the
//! [`Transport`] trait and are registered per channel type. A [`Dispatcher`]
//! value owns all routing state; construct one per process and share it by
//! `Arc`.

pub mod adapter;
pub mod config;
pub mod domain;
pub mod service;
pub mod telemetry;

pub use adapter::notifier::{ConsoleTransport, SendError, Transport};
pub use config::DispatcherConfig;
pub use domain::error::DispatchError;
pub use domain::model::channel::{ChannelConfig, ChannelType};
pub use domain::model::delivery::{
    ChannelResult, DeliveryRecord, DeliveryStatus, RouteResult,
};
pub use domain::model::notification::{Notification, NotificationPriority, NotificationType};
pub use domain::model::rule::RoutingRule;
pub use service::circuit_breaker::CircuitBreakerState;
pub use service::dispatcher::{ChannelCounters, ChannelStatistics, Dispatcher, RouterStatistics};
