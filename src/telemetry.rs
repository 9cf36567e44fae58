// src/telemetry.rs
//! Tracing setup for processes embedding the dispatcher.
//!
//! Structured logging only; span export to a tracing backend is an
//! embedding concern, not this crate's.

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Install a global `tracing` subscriber honoring `RUST_LOG`, defaulting
/// to `info`. Safe to call once per process; later calls are no-ops.
pub fn init_tracing(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let result = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    if result.is_ok() {
        info!(service = service_name, "tracing initialized");
    }
}
