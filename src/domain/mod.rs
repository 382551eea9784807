//! Core domain types and logic.

pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod metrics;
pub mod price;
pub mod reconcile;
pub mod signal;
pub mod strategy;
