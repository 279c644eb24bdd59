//! Job status and version control kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// Build health of a job as shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Error,
    Building,
    Disabled,
    Success,
}

impl JobStatus {
    /// Display ranking, lower is more urgent.
    ///
    /// Disabled and Success share a rank; it is only consulted when two
    /// unprioritised jobs need a tie-break.
    pub fn rank(self) -> u8 {
        match self {
            JobStatus::Error => 1,
            JobStatus::Building => 2,
            JobStatus::Disabled | JobStatus::Success => 3,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Error => "ERROR",
            JobStatus::Building => "BUILDING",
            JobStatus::Disabled => "DISABLED",
            JobStatus::Success => "SUCCESS",
        };
        f.write_str(name)
    }
}

/// Version control system backing a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionControl {
    Git,
    Svn,
}

impl VersionControl {
    /// Length of an abbreviated git commit hash
    pub const GIT_HASH_LENGTH: usize = 7;

    /// Shortens a stored revision for presentation.
    ///
    /// Git hashes are cut to their first seven characters; svn revision
    /// numbers are already short and pass through untouched.
    pub fn display_revision(self, revision: &str) -> String {
        match self {
            VersionControl::Git => revision.chars().take(Self::GIT_HASH_LENGTH).collect(),
            VersionControl::Svn => revision.to_string(),
        }
    }
}

impl std::str::FromStr for VersionControl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "git" => Ok(VersionControl::Git),
            "svn" => Ok(VersionControl::Svn),
            other => Err(format!("unknown version control '{}'", other)),
        }
    }
}
