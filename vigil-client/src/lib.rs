//! Vigil CI clients
//!
//! Type-safe HTTP clients for the CI backends Vigil watches. Each backend
//! implements [`ContinuousIntegrationServer`], the only view the server has
//! of a CI system: list the jobs it knows, and fetch the latest build of one.
//!
//! # Example
//!
//! ```no_run
//! use vigil_client::{ContinuousIntegrationServer, JenkinsClient};
//! use vigil_core::domain::status::{JobStatus, VersionControl};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vigil_client::CiError> {
//!     let jenkins = JenkinsClient::new("http://localhost:8080/jenkins", VersionControl::Git);
//!
//!     for job in jenkins.list_jobs().await? {
//!         let build = jenkins.latest_build_info(&job.name, JobStatus::Disabled).await?;
//!         println!("{} #{} {}", job.name, build.build_number, build.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod gitlab;
mod jenkins;

// Re-export commonly used types
pub use error::{CiError, Result};
pub use gitlab::GitlabClient;
pub use jenkins::JenkinsClient;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use vigil_core::domain::build::BuildSnapshot;
use vigil_core::domain::status::JobStatus;
use vigil_core::dto::job::JobDescriptor;

/// Query capability of a CI backend
#[async_trait]
pub trait ContinuousIntegrationServer: Send + Sync {
    /// Lists every job currently known to the backend
    async fn list_jobs(&self) -> Result<Vec<JobDescriptor>>;

    /// Fetches the latest build of a job
    ///
    /// `previous_status` is the status Vigil currently holds for the job; it
    /// lets a backend resolve ambiguous results (e.g. an unknown build result
    /// keeps the previous status rather than guessing).
    ///
    /// # Errors
    /// * [`CiError::NotFound`] - the job no longer exists
    /// * [`CiError::NoBuildYet`] - the job exists but has never built
    async fn latest_build_info(
        &self,
        job_name: &str,
        previous_status: JobStatus,
    ) -> Result<BuildSnapshot>;
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Check the status code and deserialize the JSON body of a response
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(CiError::from_status(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| CiError::Parse(format!("Failed to parse JSON response: {}", e)))
}

/// Join path segments onto a base URL, percent-encoding each segment
fn endpoint<'a>(base_url: &str, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| CiError::Parse(format!("Invalid base URL '{}': {}", base_url, e)))?;

    url.path_segments_mut()
        .map_err(|_| CiError::Parse(format!("Base URL '{}' cannot take a path", base_url)))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}
