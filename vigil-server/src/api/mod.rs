//! API Module
//!
//! HTTP and WebSocket layer of the server.
//! Each submodule handles endpoints for a specific concern.

pub mod announce;
pub mod error;
pub mod health;
pub mod job;
pub mod websocket;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::broadcaster::SessionBroadcaster;
use crate::bus::MessageBus;
use crate::registry::JobRegistry;

/// Shared handles every handler may need
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<JobRegistry>,
    pub bus: MessageBus,
    pub broadcaster: Arc<SessionBroadcaster>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Dashboard sessions
        .route("/ws", get(websocket::connect))
        // Job endpoints
        .route("/api/jobs", get(job::list_jobs))
        // Announcements
        .route("/api/iteration", post(announce::announce_iteration))
        .route("/api/status", post(announce::announce_status))
        // Add state and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
