//! Build snapshot types
//!
//! A `BuildSnapshot` is what a CI backend reports about the latest build of
//! a job at the moment it was queried.

use serde::{Deserialize, Serialize};

use crate::domain::status::JobStatus;

/// Pass/fail/skip counts reported by a build's test report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub pass_count: u32,
    pub fail_count: u32,
    pub skip_count: u32,
}

impl TestResults {
    pub fn new(pass_count: u32, fail_count: u32, skip_count: u32) -> Self {
        Self {
            pass_count,
            fail_count,
            skip_count,
        }
    }

    /// Number of tests that ran or were skipped
    pub fn total(&self) -> u32 {
        self.pass_count
            .saturating_add(self.fail_count)
            .saturating_add(self.skip_count)
    }
}

/// Latest build information for a single job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSnapshot {
    /// Commit hash or svn revision; empty when the backend doesn't know it
    pub revision: String,
    pub status: JobStatus,
    pub build_number: u64,
    /// Build start, epoch milliseconds
    pub timestamp: i64,
    /// Elapsed time against the estimated duration; may exceed 100
    pub completion_percentage: f64,
    pub comments: Vec<String>,
    pub building: bool,
    pub test_results: Option<TestResults>,
    /// Build duration in milliseconds
    pub duration: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_total() {
        assert_eq!(TestResults::new(1, 1, 2).total(), 4);
        assert_eq!(TestResults::default().total(), 0);
    }

    #[test]
    fn test_results_total_saturates() {
        assert_eq!(TestResults::new(u32::MAX, 1, 1).total(), u32::MAX);
        assert_eq!(TestResults::new(1, u32::MAX, u32::MAX).total(), u32::MAX);
    }
}
