//! PIE (Pay Income Evaluation) reporting over a local credit-line warehouse.
//!
//! Every report is a named SQL query run against the warehouse, read back
//! into typed rows, checked, then rendered or exported.

pub mod clip_results;
pub mod cohort;
pub mod collection;
pub mod config;
pub mod error;
pub mod export;
pub mod opportunity;
pub mod outcome;
pub mod query;
pub mod reconciliation;
pub mod render;
pub mod rng;
pub mod statement_cohort;
pub mod store;
pub mod success_rate;
pub mod summary;
pub mod synth;
pub mod table;
pub mod types;
pub mod window;
