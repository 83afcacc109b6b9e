//! Core domain types and logic.

pub mod position;
pub mod grouping;
pub mod rule;
pub mod rule_eval;
pub mod contract;
pub mod config_validation;
pub mod error;
