//! GitLab client
//!
//! Treats every visible, non-archived project with a pipeline on its default
//! branch as a job. The latest pipeline of the default branch is the build.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use tracing::{debug, warn};
use vigil_core::domain::build::{BuildSnapshot, TestResults};
use vigil_core::domain::status::{JobStatus, VersionControl};
use vigil_core::dto::job::JobDescriptor;

use crate::error::{CiError, Result};
use crate::{ContinuousIntegrationServer, endpoint, handle_response};

const PAGE_SIZE: &str = "100";

/// HTTP client for the GitLab v4 API
#[derive(Debug, Clone)]
pub struct GitlabClient {
    /// Base URL of GitLab (e.g., "https://gitlab.example.com")
    base_url: String,
    private_token: Option<String>,
    client: Client,
}

impl GitlabClient {
    /// Create a new GitLab client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new GitLab client with a custom HTTP client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            private_token: None,
            client,
        }
    }

    /// Authenticate every request with a personal access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.private_token = Some(token.into());
        self
    }

    /// Get the base URL of the GitLab server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let prefix: [&'a str; 2] = ["api", "v4"];
        endpoint(&self.base_url, prefix.into_iter().chain(segments))
    }

    fn get(&self, url: Url) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.private_token {
            Some(token) => request.header("PRIVATE-TOKEN", token),
            None => request,
        }
    }

    async fn latest_pipeline(&self, project_id: u64, branch: &str) -> Result<Option<PipelineRef>> {
        let id = project_id.to_string();
        let mut url = self.api(["projects", id.as_str(), "pipelines"])?;
        url.query_pairs_mut()
            .append_pair("ref", branch)
            .append_pair("order_by", "id")
            .append_pair("sort", "desc")
            .append_pair("per_page", "1");

        let response = self.get(url).send().await?;
        let pipelines: Vec<PipelineRef> = handle_response(response).await?;
        Ok(pipelines.into_iter().next())
    }
}

#[async_trait]
impl ContinuousIntegrationServer for GitlabClient {
    async fn list_jobs(&self) -> Result<Vec<JobDescriptor>> {
        let mut jobs = Vec::new();
        let mut page = "1".to_string();

        loop {
            let mut url = self.api(["projects"])?;
            url.query_pairs_mut()
                .append_pair("per_page", PAGE_SIZE)
                .append_pair("page", &page)
                .append_pair("archived", "false");

            let response = self.get(url).send().await?;
            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
                .unwrap_or_default();
            let projects: Vec<Project> = handle_response(response).await?;

            for project in projects.into_iter().filter(Project::is_watchable) {
                let Some(branch) = project.default_branch.as_deref() else {
                    continue;
                };
                match self.latest_pipeline(project.id, branch).await {
                    Ok(Some(_)) => jobs.push(project.into_descriptor()),
                    Ok(None) => debug!("Skipping {}: no pipeline yet", project.path_with_namespace),
                    Err(e) => warn!(
                        "Failed to look up pipelines for {}: {}",
                        project.path_with_namespace, e
                    ),
                }
            }

            if next_page.is_empty() {
                break;
            }
            page = next_page;
        }

        debug!("GitLab reported {} watchable project(s)", jobs.len());
        Ok(jobs)
    }

    async fn latest_build_info(
        &self,
        job_name: &str,
        _previous_status: JobStatus,
    ) -> Result<BuildSnapshot> {
        let url = self.api(["projects", job_name])?;
        let response = self.get(url).send().await?;
        let project: Project = handle_response(response).await?;

        let branch = project
            .default_branch
            .as_deref()
            .ok_or_else(|| CiError::NoBuildYet(job_name.to_string()))?;

        let id = project.id.to_string();
        let url = self.api(["projects", id.as_str(), "repository", "branches", branch])?;
        let response = self.get(url).send().await?;
        let head: Branch = handle_response(response).await?;

        let pipeline = self
            .latest_pipeline(project.id, branch)
            .await?
            .ok_or_else(|| CiError::NoBuildYet(job_name.to_string()))?;

        let pipeline_id = pipeline.id.to_string();
        let url = self.api(["projects", id.as_str(), "pipelines", pipeline_id.as_str()])?;
        let response = self.get(url).send().await?;
        let pipeline: Pipeline = handle_response(response).await?;

        Ok(pipeline.into_snapshot(head.commit))
    }
}

// =============================================================================
// GitLab API payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct Project {
    id: u64,
    path_with_namespace: String,
    web_url: String,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    visibility: Option<String>,
    default_branch: Option<String>,
}

impl Project {
    fn is_watchable(&self) -> bool {
        !self.archived && self.visibility.as_deref() != Some("private")
    }

    fn into_descriptor(self) -> JobDescriptor {
        JobDescriptor {
            name: self.path_with_namespace,
            url: format!("{}/pipelines/", self.web_url),
            version_control: VersionControl::Git,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Branch {
    commit: Commit,
}

#[derive(Debug, Deserialize)]
struct Commit {
    id: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct PipelineRef {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Pipeline {
    id: u64,
    status: Option<String>,
    started_at: Option<DateTime<Utc>>,
    /// Seconds
    duration: Option<f64>,
}

impl Pipeline {
    fn into_snapshot(self, head: Commit) -> BuildSnapshot {
        let status = parse_status(self.status.as_deref());
        let building = status == JobStatus::Building;

        BuildSnapshot {
            revision: head.id,
            status,
            build_number: self.id,
            timestamp: self.started_at.map(|t| t.timestamp_millis()).unwrap_or(0),
            completion_percentage: if building { 0.0 } else { 100.0 },
            comments: vec![head.message],
            building,
            test_results: Some(TestResults::default()),
            duration: self.duration.map(|secs| (secs * 1000.0) as i64).unwrap_or(0),
        }
    }
}

/// Maps a GitLab pipeline status onto a job status
fn parse_status(status: Option<&str>) -> JobStatus {
    match status {
        None => JobStatus::Disabled,
        Some("failed") => JobStatus::Error,
        Some("canceled") | Some("skipped") => JobStatus::Disabled,
        Some("pending") | Some("running") => JobStatus::Building,
        Some("success") => JobStatus::Success,
        Some(_) => JobStatus::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(None), JobStatus::Disabled);
        assert_eq!(parse_status(Some("failed")), JobStatus::Error);
        assert_eq!(parse_status(Some("canceled")), JobStatus::Disabled);
        assert_eq!(parse_status(Some("skipped")), JobStatus::Disabled);
        assert_eq!(parse_status(Some("pending")), JobStatus::Building);
        assert_eq!(parse_status(Some("running")), JobStatus::Building);
        assert_eq!(parse_status(Some("success")), JobStatus::Success);
        assert_eq!(parse_status(Some("manual")), JobStatus::Error);
    }

    #[test]
    fn test_project_filtering() {
        let project: Project = serde_json::from_value(json!({
            "id": 7,
            "path_with_namespace": "team/app",
            "web_url": "https://gitlab.local/team/app",
            "archived": false,
            "visibility": "internal",
            "default_branch": "main"
        }))
        .unwrap();
        assert!(project.is_watchable());

        let descriptor = project.into_descriptor();
        assert_eq!(descriptor.name, "team/app");
        assert_eq!(descriptor.url, "https://gitlab.local/team/app/pipelines/");
        assert_eq!(descriptor.version_control, VersionControl::Git);

        let private: Project = serde_json::from_value(json!({
            "id": 8,
            "path_with_namespace": "team/secret",
            "web_url": "https://gitlab.local/team/secret",
            "visibility": "private",
            "default_branch": "main"
        }))
        .unwrap();
        assert!(!private.is_watchable());
    }

    #[test]
    fn test_running_pipeline_snapshot() {
        let pipeline: Pipeline = serde_json::from_value(json!({
            "id": 99,
            "status": "running",
            "started_at": "2024-01-01T00:00:01Z",
            "duration": null
        }))
        .unwrap();
        let head = Commit {
            id: "0123456789abcdef".to_string(),
            message: "Add feature".to_string(),
        };

        let snapshot = pipeline.into_snapshot(head);
        assert_eq!(snapshot.status, JobStatus::Building);
        assert!(snapshot.building);
        assert_eq!(snapshot.build_number, 99);
        assert_eq!(snapshot.timestamp, 1_704_067_201_000);
        assert_eq!(snapshot.completion_percentage, 0.0);
        assert_eq!(snapshot.comments, vec!["Add feature".to_string()]);
        assert_eq!(snapshot.test_results, Some(TestResults::default()));
        assert_eq!(snapshot.duration, 0);
    }

    #[test]
    fn test_finished_pipeline_snapshot() {
        let pipeline: Pipeline = serde_json::from_value(json!({
            "id": 100,
            "status": "success",
            "started_at": null,
            "duration": 12.5
        }))
        .unwrap();
        let head = Commit {
            id: "abc".to_string(),
            message: String::new(),
        };

        let snapshot = pipeline.into_snapshot(head);
        assert_eq!(snapshot.status, JobStatus::Success);
        assert!(!snapshot.building);
        assert_eq!(snapshot.timestamp, 0);
        assert_eq!(snapshot.completion_percentage, 100.0);
        assert_eq!(snapshot.duration, 12_500);
    }
}
