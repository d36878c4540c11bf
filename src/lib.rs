//! Floodgate - Store-Backed Admission Control
//!
//! This crate implements a dual-window admission-control decision engine.
//! Every identity is tracked by two independent fixed-window counters — a
//! long-horizon "total" budget and a short-horizon "burst" budget — persisted
//! in a shared key-value store (Redis in production) so the decision is
//! consistent across multiple process instances.

pub mod ratelimit;
pub mod store;
pub mod config;
pub mod error;
