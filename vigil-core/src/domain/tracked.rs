//! Tracked job entity
//!
//! `TrackedJob` pairs a `Job` with the static per-job settings that come from
//! configuration. The job itself sits behind a mutex: the poller mutates it
//! while connection handlers read it, and a reader must never see a
//! half-applied update.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::build::BuildSnapshot;
use crate::domain::job::Job;
use crate::domain::status::JobStatus;
use crate::dto::job::PublishableJob;

/// Static settings attached to a job when it is first discovered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSettings {
    /// Higher sorts first on the dashboard
    pub priority: i32,
    /// Record test results whenever a build completes
    pub persist_test_results: bool,
    /// Publish commit comments alongside the job
    pub display_comments: bool,
}

/// A job as held by the registry
#[derive(Debug)]
pub struct TrackedJob {
    name: String,
    settings: JobSettings,
    job: Mutex<Job>,
}

impl TrackedJob {
    pub fn new(job: Job, settings: JobSettings) -> Self {
        Self {
            name: job.name().to_string(),
            settings,
            job: Mutex::new(job),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.settings.priority
    }

    pub fn settings(&self) -> JobSettings {
        self.settings
    }

    pub fn should_persist_test_results(&self) -> bool {
        self.settings.persist_test_results
    }

    /// Current backend status, handed to the CI client as context
    pub fn status(&self) -> JobStatus {
        self.lock().status()
    }

    /// Applies a snapshot under the entity lock
    pub fn apply_update(&self, snapshot: BuildSnapshot) -> bool {
        self.lock().apply_update(snapshot)
    }

    pub fn has_just_completed(&self) -> bool {
        self.lock().has_just_completed()
    }

    /// Clones the current state of the job
    pub fn current(&self) -> Job {
        self.lock().clone()
    }

    /// Builds the dashboard view of this job from a consistent read
    pub fn publishable(&self) -> PublishableJob {
        let job = self.lock();
        PublishableJob::from_job(&job, self.settings.priority, self.settings.display_comments)
    }

    fn lock(&self) -> MutexGuard<'_, Job> {
        // A panic while holding the lock can only happen between whole-field
        // writes of `apply_update`; the job is still readable.
        self.job.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::build::TestResults;
    use crate::domain::status::VersionControl;

    fn snapshot() -> BuildSnapshot {
        BuildSnapshot {
            revision: "abcdef1234".to_string(),
            status: JobStatus::Error,
            build_number: 7,
            timestamp: 1_000,
            completion_percentage: 100.0,
            comments: vec!["broke it".to_string()],
            building: false,
            test_results: Some(TestResults::new(3, 1, 0)),
            duration: 20,
        }
    }

    #[test]
    fn test_publishable_hides_comments_unless_enabled() {
        let job = Job::new("a", "http://a", JobStatus::Disabled, VersionControl::Git);
        let tracked = TrackedJob::new(job.clone(), JobSettings::default());
        tracked.apply_update(snapshot());
        assert!(tracked.publishable().comments.is_empty());

        let tracked = TrackedJob::new(
            job,
            JobSettings {
                display_comments: true,
                ..Default::default()
            },
        );
        tracked.apply_update(snapshot());
        assert_eq!(tracked.publishable().comments, vec!["broke it".to_string()]);
    }

    #[test]
    fn test_publishable_carries_priority_and_truncated_revision() {
        let job = Job::new("a", "http://a", JobStatus::Disabled, VersionControl::Git);
        let tracked = TrackedJob::new(
            job,
            JobSettings {
                priority: 4,
                ..Default::default()
            },
        );
        assert!(tracked.apply_update(snapshot()));

        let published = tracked.publishable();
        assert_eq!(published.name, "a");
        assert_eq!(published.url, "http://a");
        assert_eq!(published.priority, 4);
        assert_eq!(published.revision, "abcdef1");
        assert_eq!(published.status, JobStatus::Error);
        assert_eq!(published.build_number, 7);
        assert_eq!(published.test_results, Some(TestResults::new(3, 1, 0)));
        assert_eq!(tracked.current().revision(), "abcdef1234");
    }
}
