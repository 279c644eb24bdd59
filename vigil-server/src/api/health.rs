//! Health Check API Handler
//!
//! Health check endpoint for monitoring, with a glance at what the server
//! is currently tracking.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub jobs: usize,
    pub sessions: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        jobs: state.registry.len(),
        sessions: state.broadcaster.session_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::domain::job::Job;
    use vigil_core::domain::status::{JobStatus, VersionControl};
    use vigil_core::domain::tracked::{JobSettings, TrackedJob};

    use crate::api::testing::state;

    #[tokio::test]
    async fn test_reports_jobs_and_sessions() {
        let (state, _frames) = state(1);
        let job = Job::new("app", "http://ci", JobStatus::Success, VersionControl::Git);
        state.registry.add(TrackedJob::new(job, JobSettings::default()));
        let (_id, _queue) = state.broadcaster.connect();

        let Json(health) = health_check(State(state)).await;

        assert_eq!(health.status, "ok");
        assert_eq!(health.jobs, 1);
        assert_eq!(health.sessions, 1);
    }
}
