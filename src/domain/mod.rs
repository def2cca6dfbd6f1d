//! Core domain types and logic.

pub mod ohlcv;
pub mod price_history;
pub mod price_lookup;
pub mod indicator;
pub mod score;
pub mod rank_snapshot;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod rotation;
pub mod backtest;
pub mod metrics;
pub mod universe;
pub mod config_validation;
pub mod error;
