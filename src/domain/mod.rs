//! Core domain types and logic.

pub mod observation;
pub mod series;
pub mod position;
pub mod rule;
pub mod rule_parser;
pub mod rule_eval;
pub mod strategy;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
