// src/service/mod.rs

pub mod batch_queue;
pub mod channel_registry;
pub mod circuit_breaker;
pub mod delivery_tracker;
pub mod dispatcher;
pub mod rate_limiter;
pub mod retry_sender;
pub mod routing_engine;
