//! Core domain types and logic.

pub mod ohlcv;
pub mod signal;
pub mod indicator;
pub mod strategy;
pub mod position;
pub mod execution;
pub mod simulation;
pub mod metrics;
pub mod benchmark;
pub mod backtest;
pub mod walk_forward;
pub mod config_validation;
pub mod error;
