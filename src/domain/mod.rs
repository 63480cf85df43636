//! Core domain types and pure computations over a trade snapshot.

pub mod analysis;
pub mod benchmark;
pub mod config_validation;
pub mod error;
pub mod metrics;
pub mod pattern;
pub mod price;
pub mod recommendation;
pub mod risk;
pub mod stats;
pub mod trade;
