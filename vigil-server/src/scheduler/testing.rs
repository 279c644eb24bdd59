//! Scripted collaborators for scheduler tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use vigil_client::{CiError, ContinuousIntegrationServer};
use vigil_core::domain::build::{BuildSnapshot, TestResults};
use vigil_core::domain::status::{JobStatus, VersionControl};
use vigil_core::dto::job::JobDescriptor;
use vigil_core::dto::test_results::TestResultRecord;

use crate::service::TestResultsRecorder;

/// What the fake backend answers for one build query
#[derive(Debug, Clone)]
pub enum Reply {
    Build(BuildSnapshot),
    Status(u16),
    Panic,
}

/// CI backend answering from per-job scripts
///
/// Each job's last scripted reply repeats once the script runs out.
#[derive(Default)]
pub struct FakeCi {
    listings: Mutex<VecDeque<Result<Vec<JobDescriptor>, u16>>>,
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCi {
    pub fn push_listing(&self, listing: Result<Vec<JobDescriptor>, u16>) {
        self.listings.lock().unwrap().push_back(listing);
    }

    pub fn script(&self, job: &str, replies: impl IntoIterator<Item = Reply>) {
        self.replies
            .lock()
            .unwrap()
            .insert(job.to_string(), replies.into_iter().collect());
    }

    /// Number of build queries made for a job
    pub fn calls_for(&self, job: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|name| *name == job).count()
    }

    fn next_reply(&self, job: &str) -> Option<Reply> {
        let mut replies = self.replies.lock().unwrap();
        let script = replies.get_mut(job)?;
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl ContinuousIntegrationServer for FakeCi {
    async fn list_jobs(&self) -> vigil_client::Result<Vec<JobDescriptor>> {
        let listing = self.listings.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()));
        listing.map_err(|status| CiError::from_status(status, "scripted"))
    }

    async fn latest_build_info(
        &self,
        job_name: &str,
        _previous_status: JobStatus,
    ) -> vigil_client::Result<BuildSnapshot> {
        self.calls.lock().unwrap().push(job_name.to_string());

        match self.next_reply(job_name) {
            Some(Reply::Build(snapshot)) => Ok(snapshot),
            Some(Reply::Status(status)) => Err(CiError::from_status(status, job_name)),
            Some(Reply::Panic) => panic!("scripted panic for {}", job_name),
            None => Err(CiError::from_status(400, job_name)),
        }
    }
}

/// Recorder keeping every record in memory
#[derive(Default)]
pub struct RecordingRecorder {
    records: Mutex<Vec<TestResultRecord>>,
}

impl RecordingRecorder {
    pub fn records(&self) -> Vec<TestResultRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl TestResultsRecorder for RecordingRecorder {
    async fn record(&self, record: TestResultRecord) {
        self.records.lock().unwrap().push(record);
    }
}

pub fn descriptor(name: &str) -> JobDescriptor {
    JobDescriptor {
        name: name.to_string(),
        url: format!("http://ci.local/job/{}/", name),
        version_control: VersionControl::Git,
    }
}

/// A finished build
pub fn finished(build_number: u64, status: JobStatus) -> BuildSnapshot {
    BuildSnapshot {
        revision: "5435dsd5435dsd".to_string(),
        status,
        build_number,
        timestamp: 5,
        completion_percentage: 100.0,
        comments: Vec::new(),
        building: false,
        test_results: Some(TestResults::new(1, 1, 2)),
        duration: 30,
    }
}

/// A build still running
pub fn running(build_number: u64) -> BuildSnapshot {
    BuildSnapshot {
        building: true,
        status: JobStatus::Building,
        completion_percentage: 40.0,
        test_results: None,
        ..finished(build_number, JobStatus::Building)
    }
}
