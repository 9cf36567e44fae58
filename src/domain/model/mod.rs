// src/domain/model/mod.rs

pub mod channel;
pub mod delivery;
pub mod notification;
pub mod rule;
