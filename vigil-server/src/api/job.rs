//! Job API Handlers

use axum::{Json, extract::State};
use vigil_core::dto::job::PublishableJob;

use crate::api::AppState;

/// GET /api/jobs
/// Every tracked job in dashboard order
pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<PublishableJob>> {
    let jobs = state.registry.snapshot();
    tracing::debug!("Listing {} job(s)", jobs.len());
    Json(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::domain::job::Job;
    use vigil_core::domain::status::{JobStatus, VersionControl};
    use vigil_core::domain::tracked::{JobSettings, TrackedJob};

    use crate::api::testing::state;

    fn track(state: &AppState, name: &str, status: JobStatus) {
        let job = Job::new(name, "http://ci", status, VersionControl::Git);
        state.registry.add(TrackedJob::new(job, JobSettings::default()));
    }

    #[tokio::test]
    async fn test_empty_registry_lists_nothing() {
        let (state, _frames) = state(1);

        let Json(jobs) = list_jobs(State(state)).await;

        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn test_jobs_listed_in_display_order() {
        let (state, _frames) = state(1);
        track(&state, "green", JobStatus::Success);
        track(&state, "broken", JobStatus::Error);

        let Json(jobs) = list_jobs(State(state)).await;

        let names: Vec<&str> = jobs.iter().map(|job| job.name.as_str()).collect();
        assert_eq!(names, vec!["broken", "green"]);
        assert_eq!(jobs[0].status, JobStatus::Error);
    }
}
