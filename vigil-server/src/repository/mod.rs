//! Repository Module
//!
//! Data access layer of the server. Each repository handles database
//! operations for one table.

pub mod test_results;

pub use test_results as test_results_repository;
