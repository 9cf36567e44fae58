// src/adapter/mod.rs

pub mod notifier;
