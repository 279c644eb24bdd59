//! Core domain types
//!
//! This module contains the domain structures shared by the CI clients
//! (which produce build snapshots) and the server (which tracks jobs and
//! decides when a snapshot is worth publishing).

pub mod build;
pub mod job;
pub mod status;
pub mod tracked;
