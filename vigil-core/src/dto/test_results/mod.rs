//! Test result records handed to persistence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::build::TestResults;

/// Test outcome of one completed build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResultRecord {
    pub job_name: String,
    pub revision: String,
    pub total: u32,
    pub pass_count: u32,
    pub fail_count: u32,
    pub start_time: DateTime<Utc>,
    pub duration_ms: i64,
}

impl TestResultRecord {
    /// Builds a record from a completed build
    ///
    /// A build without a test report records zero counts. `timestamp` is the
    /// build start in epoch milliseconds.
    pub fn new(
        job_name: impl Into<String>,
        revision: impl Into<String>,
        results: Option<TestResults>,
        timestamp: i64,
        duration_ms: i64,
    ) -> Self {
        let results = results.unwrap_or_default();
        Self {
            job_name: job_name.into(),
            revision: revision.into(),
            total: results.total(),
            pass_count: results.pass_count,
            fail_count: results.fail_count,
            start_time: DateTime::from_timestamp_millis(timestamp).unwrap_or_default(),
            duration_ms,
        }
    }
}
