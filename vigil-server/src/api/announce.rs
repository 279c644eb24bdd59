//! Announcement API Handlers
//!
//! Operators push the current iteration name and a free-form status line to
//! every dashboard.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct Announcement {
    pub label: String,
}

impl Announcement {
    fn validated(self) -> ApiResult<String> {
        let label = self.label.trim();
        if label.is_empty() {
            return Err(ApiError::BadRequest("label cannot be empty".to_string()));
        }
        Ok(label.to_string())
    }
}

/// POST /api/iteration
pub async fn announce_iteration(
    State(state): State<AppState>,
    Json(req): Json<Announcement>,
) -> ApiResult<StatusCode> {
    let label = req.validated()?;
    tracing::info!("Announcing iteration: {}", label);

    state.bus.iteration_update(&label)?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /api/status
pub async fn announce_status(
    State(state): State<AppState>,
    Json(req): Json<Announcement>,
) -> ApiResult<StatusCode> {
    let label = req.validated()?;
    tracing::info!("Announcing status: {}", label);

    state.bus.status_update(&label)?;
    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::dto::frame::OutboundFrame;

    use crate::api::testing::state;

    fn announcement(label: &str) -> Json<Announcement> {
        Json(Announcement {
            label: label.to_string(),
        })
    }

    #[tokio::test]
    async fn test_iteration_is_published() {
        let (state, mut frames) = state(4);

        let status = announce_iteration(State(state), announcement(" Sprint 12 "))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(
            frames.try_recv().unwrap(),
            OutboundFrame::IterationUpdate("Sprint 12".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_label_is_rejected() {
        let (state, mut frames) = state(4);

        let result = announce_status(State(state), announcement("  ")).await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
        assert!(frames.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_bus_is_unavailable() {
        let (state, _frames) = state(1);
        announce_status(State(state.clone()), announcement("one"))
            .await
            .unwrap();

        let result = announce_status(State(state), announcement("two")).await;

        assert!(matches!(result, Err(ApiError::Unavailable(_))));
    }
}
