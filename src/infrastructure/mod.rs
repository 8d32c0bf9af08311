//! Concrete venue adapters and the cross-cutting plumbing they share.

pub mod binance;
pub mod broker;
pub mod core;
