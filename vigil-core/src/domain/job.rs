//! Job domain types
//!
//! `Job` is the canonical view of one CI pipeline. It only changes through
//! [`Job::apply_update`], which decides whether a freshly polled snapshot
//! says anything the dashboard should hear about.

use serde::{Deserialize, Serialize};

use crate::domain::build::{BuildSnapshot, TestResults};
use crate::domain::status::{JobStatus, VersionControl};

/// A tracked build pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    name: String,
    url: String,
    version_control: VersionControl,
    revision: String,
    status: JobStatus,
    display_status: JobStatus,
    build_number: u64,
    timestamp: i64,
    completion_percentage: f64,
    comments: Vec<String>,
    building: bool,
    has_just_completed: bool,
    test_results: Option<TestResults>,
}

impl Job {
    /// Creates a job that has not been polled yet
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        status: JobStatus,
        version_control: VersionControl,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            version_control,
            revision: String::new(),
            status,
            display_status: status,
            build_number: 0,
            timestamp: 0,
            completion_percentage: 0.0,
            comments: Vec::new(),
            building: false,
            has_just_completed: false,
            test_results: None,
        }
    }

    /// Applies a polled snapshot, returning whether anything meaningful changed
    ///
    /// When nothing changed the job is left exactly as it was, including
    /// `has_just_completed` from an earlier call.
    pub fn apply_update(&mut self, snapshot: BuildSnapshot) -> bool {
        if !self.differs_from(&snapshot) {
            return false;
        }

        if !snapshot.revision.is_empty() {
            self.revision = snapshot.revision;
        }
        self.status = snapshot.status;
        if snapshot.status != JobStatus::Building {
            self.display_status = snapshot.status;
        }
        self.build_number = snapshot.build_number;
        self.timestamp = snapshot.timestamp;
        self.completion_percentage = snapshot.completion_percentage;
        self.comments = snapshot.comments;
        self.test_results = snapshot.test_results;
        self.has_just_completed = self.building && !snapshot.building;
        self.building = snapshot.building;

        true
    }

    fn differs_from(&self, snapshot: &BuildSnapshot) -> bool {
        let revision_changed = !snapshot.revision.is_empty() && snapshot.revision != self.revision;

        revision_changed
            || snapshot.status != self.status
            || snapshot.build_number != self.build_number
            || completion_changed(self.completion_percentage, snapshot.completion_percentage)
            || snapshot.building != self.building
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn version_control(&self) -> VersionControl {
        self.version_control
    }

    /// Full stored revision, used for change detection and persistence
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Revision as shown to users
    pub fn display_revision(&self) -> String {
        self.version_control.display_revision(&self.revision)
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Last status that wasn't Building
    pub fn display_status(&self) -> JobStatus {
        self.display_status
    }

    pub fn build_number(&self) -> u64 {
        self.build_number
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn completion_percentage(&self) -> f64 {
        self.completion_percentage
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn is_building(&self) -> bool {
        self.building
    }

    /// True only after the update in which `building` went from true to false
    pub fn has_just_completed(&self) -> bool {
        self.has_just_completed
    }

    pub fn test_results(&self) -> Option<TestResults> {
        self.test_results
    }
}

/// Percentages past 100 all mean "overran the estimate" and compare equal.
fn completion_changed(current: f64, incoming: f64) -> bool {
    if current > 100.0 && incoming > 100.0 {
        return false;
    }
    current.total_cmp(&incoming).is_ne()
}
