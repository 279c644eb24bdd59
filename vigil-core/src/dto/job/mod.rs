//! Job DTOs

use serde::{Deserialize, Serialize};

use crate::domain::build::TestResults;
use crate::domain::job::Job;
use crate::domain::status::{JobStatus, VersionControl};

/// A job as listed by a CI backend during discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub name: String,
    pub url: String,
    pub version_control: VersionControl,
}

impl JobDescriptor {
    /// Builds the initial, not yet polled, job for this descriptor
    pub fn into_job(self) -> Job {
        Job::new(self.name, self.url, JobStatus::Disabled, self.version_control)
    }
}

/// Dashboard view of a job, sent inside `jobUpdate` frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishableJob {
    pub name: String,
    pub url: String,
    pub priority: i32,
    pub revision: String,
    pub status: JobStatus,
    pub display_status: JobStatus,
    pub build_number: u64,
    pub timestamp: i64,
    pub completion_percentage: f64,
    pub comments: Vec<String>,
    pub building: bool,
    pub test_results: Option<TestResults>,
}

impl PublishableJob {
    pub fn from_job(job: &Job, priority: i32, display_comments: bool) -> Self {
        Self {
            name: job.name().to_string(),
            url: job.url().to_string(),
            priority,
            revision: job.display_revision(),
            status: job.status(),
            display_status: job.display_status(),
            build_number: job.build_number(),
            timestamp: job.timestamp(),
            completion_percentage: job.completion_percentage(),
            comments: if display_comments {
                job.comments().to_vec()
            } else {
                Vec::new()
            },
            building: job.is_building(),
            test_results: job.test_results(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_into_job() {
        let descriptor = JobDescriptor {
            name: "Tom".to_string(),
            url: "stuff.com".to_string(),
            version_control: VersionControl::Git,
        };

        let job = descriptor.into_job();
        assert_eq!(job.name(), "Tom");
        assert_eq!(job.url(), "stuff.com");
        assert_eq!(job.status(), JobStatus::Disabled);
    }

    #[test]
    fn test_publishable_serializes_camel_case() {
        let job = Job::new("a", "http://a", JobStatus::Success, VersionControl::Svn);
        let value = serde_json::to_value(PublishableJob::from_job(&job, 2, false)).unwrap();

        assert_eq!(value["name"], "a");
        assert_eq!(value["displayStatus"], "SUCCESS");
        assert_eq!(value["buildNumber"], 0);
        assert_eq!(value["completionPercentage"], 0.0);
        assert!(value["testResults"].is_null());
    }
}
