//! Jenkins client
//!
//! Talks to the Jenkins JSON API:
//! - `GET /api/json` to discover jobs
//! - `GET /job/{name}/api/json` to find the last build
//! - `GET {lastBuild.url}/api/json` for the build details

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use tracing::debug;
use vigil_core::domain::build::{BuildSnapshot, TestResults};
use vigil_core::domain::status::{JobStatus, VersionControl};
use vigil_core::dto::job::JobDescriptor;

use crate::error::{CiError, Result};
use crate::{ContinuousIntegrationServer, endpoint, handle_response};

const BUILD_TREE: &str = "number,timestamp,estimatedDuration,duration,building,result,\
changeSet[items[comment]],actions[lastBuiltRevision[SHA1],urlName,failCount,skipCount,totalCount]";

/// HTTP client for a Jenkins server
#[derive(Debug, Clone)]
pub struct JenkinsClient {
    /// Base URL of Jenkins (e.g., "http://localhost:8080/jenkins")
    base_url: String,
    /// Version control used by every job on this server
    version_control: VersionControl,
    credentials: Option<(String, String)>,
    client: Client,
}

impl JenkinsClient {
    /// Create a new Jenkins client
    ///
    /// # Arguments
    /// * `base_url` - The Jenkins root URL
    /// * `version_control` - VCS of the jobs, decides how revisions are displayed
    pub fn new(base_url: impl Into<String>, version_control: VersionControl) -> Self {
        Self::with_client(base_url, version_control, Client::new())
    }

    /// Create a new Jenkins client with a custom HTTP client
    pub fn with_client(
        base_url: impl Into<String>,
        version_control: VersionControl,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            version_control,
            credentials: None,
            client,
        }
    }

    /// Authenticate every request with HTTP basic auth
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Get the base URL of the Jenkins server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, url: Url) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.credentials {
            Some((username, password)) => request.basic_auth(username, Some(password)),
            None => request,
        }
    }

    /// `/job/a/job/b` for a job nested in folder `a`
    fn job_url(&self, job_name: &str, rest: &[&str]) -> Result<Url> {
        let segments = job_name
            .split('/')
            .flat_map(|segment| ["job", segment])
            .chain(rest.iter().copied());
        endpoint(&self.base_url, segments)
    }
}

#[async_trait]
impl ContinuousIntegrationServer for JenkinsClient {
    async fn list_jobs(&self) -> Result<Vec<JobDescriptor>> {
        let mut url = endpoint(&self.base_url, ["api", "json"])?;
        url.query_pairs_mut().append_pair("tree", "jobs[name,url]");

        let response = self.get(url).send().await?;
        let listing: JobListing = handle_response(response).await?;

        debug!("Jenkins reported {} job(s)", listing.jobs.len());

        Ok(listing
            .jobs
            .into_iter()
            .map(|job| JobDescriptor {
                name: job.name,
                url: job.url,
                version_control: self.version_control,
            })
            .collect())
    }

    async fn latest_build_info(
        &self,
        job_name: &str,
        previous_status: JobStatus,
    ) -> Result<BuildSnapshot> {
        let mut url = self.job_url(job_name, &["api", "json"])?;
        url.query_pairs_mut()
            .append_pair("tree", "buildable,lastBuild[number,url]");

        let response = self.get(url).send().await?;
        let details: JobDetails = handle_response(response).await?;

        let last_build = details
            .last_build
            .ok_or_else(|| CiError::NoBuildYet(job_name.to_string()))?;

        let mut url = endpoint(&last_build.url, ["api", "json"])?;
        url.query_pairs_mut().append_pair("tree", BUILD_TREE);

        let response = self.get(url).send().await?;
        let build: BuildDetails = handle_response(response).await?;

        let now = chrono::Utc::now().timestamp_millis();
        Ok(build.into_snapshot(details.buildable, previous_status, now))
    }
}

// =============================================================================
// Jenkins API payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct JobListing {
    #[serde(default)]
    jobs: Vec<ListedJob>,
}

#[derive(Debug, Deserialize)]
struct ListedJob {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobDetails {
    #[serde(default = "buildable_by_default")]
    buildable: bool,
    last_build: Option<BuildRef>,
}

fn buildable_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct BuildRef {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildDetails {
    number: u64,
    timestamp: i64,
    #[serde(default)]
    estimated_duration: i64,
    #[serde(default)]
    duration: i64,
    #[serde(default)]
    building: bool,
    result: Option<String>,
    change_set: Option<ChangeSet>,
    #[serde(default)]
    actions: Vec<Action>,
}

#[derive(Debug, Deserialize)]
struct ChangeSet {
    #[serde(default)]
    items: Vec<ChangeSetItem>,
}

#[derive(Debug, Deserialize)]
struct ChangeSetItem {
    #[serde(default)]
    comment: String,
}

/// Jenkins mixes unrelated action objects in one array; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Action {
    last_built_revision: Option<BuiltRevision>,
    url_name: Option<String>,
    fail_count: Option<u32>,
    skip_count: Option<u32>,
    total_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct BuiltRevision {
    #[serde(rename = "SHA1")]
    sha1: String,
}

impl BuildDetails {
    fn into_snapshot(self, buildable: bool, previous_status: JobStatus, now: i64) -> BuildSnapshot {
        let status = if buildable {
            parse_result(self.result.as_deref(), previous_status)
        } else {
            JobStatus::Disabled
        };

        let revision = self
            .actions
            .iter()
            .find_map(|action| action.last_built_revision.as_ref())
            .map(|revision| revision.sha1.clone())
            .unwrap_or_default();

        let test_results = self
            .actions
            .iter()
            .find(|action| action.url_name.as_deref() == Some("testReport"))
            .map(|action| {
                let fail = action.fail_count.unwrap_or(0);
                let skip = action.skip_count.unwrap_or(0);
                let total = action.total_count.unwrap_or(0);
                TestResults::new(total.saturating_sub(fail.saturating_add(skip)), fail, skip)
            });

        let comments = self
            .change_set
            .map(|change_set| change_set.items.into_iter().map(|item| item.comment).collect())
            .unwrap_or_default();

        BuildSnapshot {
            revision,
            status,
            build_number: self.number,
            timestamp: self.timestamp,
            completion_percentage: completion_percentage(now, self.timestamp, self.estimated_duration),
            comments,
            building: self.building,
            test_results,
            duration: self.duration,
        }
    }
}

/// Maps a Jenkins build result onto a job status
///
/// A build still running has no result yet. Results Jenkins may add in the
/// future keep whatever status the job already had.
fn parse_result(result: Option<&str>, previous_status: JobStatus) -> JobStatus {
    match result {
        None => JobStatus::Building,
        Some("ABORTED") | Some("FAILURE") | Some("UNSTABLE") => JobStatus::Error,
        Some("SUCCESS") => JobStatus::Success,
        Some("NOT_BUILT") => JobStatus::Disabled,
        Some("BUILDING") | Some("REBUILDING") => JobStatus::Building,
        Some(_) => previous_status,
    }
}

/// Elapsed time of a build against Jenkins' estimate, in percent
fn completion_percentage(now: i64, started_at: i64, estimated_duration: i64) -> f64 {
    if estimated_duration <= 0 {
        return 0.0;
    }
    (now - started_at) as f64 / estimated_duration as f64 * 100.0
}
