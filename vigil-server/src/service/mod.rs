//! Service Module
//!
//! Business logic layer of the server.
//! Services sit between the scheduler and the repositories.

pub mod recorder;

pub use recorder::{LoggingRecorder, PgTestResultsRecorder, TestResultsRecorder};
