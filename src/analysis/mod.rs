//! Analysis modules.
//!
//! Filtering, aggregation and ranking over the in-memory response set.

pub mod aggregator;
pub mod dashboard;
pub mod filter;
pub mod ranking;

pub use dashboard::Dashboard;
