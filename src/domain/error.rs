// src/domain/error.rs

use thiserror::Error;

use crate::domain::model::channel::ChannelType;

/// Errors surfaced to callers of the dispatcher API.
///
/// Per-channel delivery failures are never reported through this type: they
/// are captured in the `RouteResult` / `DeliveryRecord` of the affected
/// notification. `DispatchError` covers caller mistakes only.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no transport registered for channel type {0}")]
    TransportMissing(ChannelType),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("no delivery record for notification: {0}")]
    UnknownNotification(String),

    #[error("invalid channel configuration for '{name}': {reason}")]
    InvalidChannelConfig { name: String, reason: String },
}
