//! Core domain types and logic.

pub mod advisory;
pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod indicator_helpers;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod position;
pub mod scanner;
pub mod signal;
pub mod timeframe;
pub mod universe;
