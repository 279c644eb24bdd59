//! Vigil Server
//!
//! Watches a CI backend and pushes live build state to dashboards.
//!
//! Architecture:
//! - Configuration: settings from environment variables
//! - Scheduler: discovery and update passes against the CI backend
//! - Registry: the jobs currently tracked
//! - Bus and broadcaster: outbound frames fanned out to every session
//! - API: health, job snapshot, announcements and the dashboard WebSocket
//! - Services and repositories: optional test result persistence

mod api;
mod broadcaster;
mod bus;
mod config;
mod db;
mod registry;
mod repository;
mod scheduler;
mod service;
mod shutdown;

use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vigil_client::{ContinuousIntegrationServer, GitlabClient, JenkinsClient};

use crate::api::AppState;
use crate::broadcaster::{Clock, SessionBroadcaster, SystemClock};
use crate::bus::BusSubscriber;
use crate::config::{CiBackend, Config};
use crate::registry::JobRegistry;
use crate::scheduler::{JobFinder, JobUpdater, Poller};
use crate::service::{LoggingRecorder, PgTestResultsRecorder, TestResultsRecorder};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Vigil");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: backend={:?}, ci_url={}",
        config.ci_backend, config.ci_url
    );

    let ci = ci_client(&config);
    let recorder = test_results_recorder(&config).await?;

    let registry = Arc::new(JobRegistry::new(config.job_priorities.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let broadcaster = Arc::new(SessionBroadcaster::new(
        Arc::clone(&registry),
        Arc::clone(&clock),
        clock.now_millis(),
    ));
    let (bus, frames) = bus::channel(config.bus_capacity);

    let shutdown = shutdown::install_shutdown_handler();

    // Fan frames out to sessions
    let subscriber = tokio::spawn(
        BusSubscriber::new(frames, Arc::clone(&broadcaster)).run(shutdown.clone()),
    );

    // Start polling loop
    let poller = Poller::new(
        JobFinder::new(
            Arc::clone(&ci),
            Arc::clone(&registry),
            config.persist_test_results_jobs.clone(),
            config.display_comments_jobs.clone(),
        ),
        JobUpdater::new(ci, Arc::clone(&registry), bus.clone(), recorder),
        config.discovery_interval,
        config.update_interval,
    );
    let poller_shutdown = shutdown.clone();
    let polling = tokio::spawn(async move {
        let result = poller.run(poller_shutdown.clone()).await;
        if let Err(e) = &result {
            error!("Poller stopped: {}", e);
            poller_shutdown.cancel();
        }
        result
    });

    // Build router with all API endpoints
    let app = api::create_router(AppState {
        registry,
        bus,
        broadcaster,
    });

    info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await
        .context("HTTP server failed")?;

    // The server may also stop on its own; make sure the background tasks follow
    shutdown.cancel();

    if let Err(e) = subscriber.await {
        error!("Bus subscriber task failed: {}", e);
    }

    match polling.await {
        Ok(Ok(())) => {
            info!("Vigil stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(e).context("Polling stopped on a message bus failure"),
        Err(e) => Err(anyhow!("Poller task failed: {}", e)),
    }
}

/// Loads and validates configuration from environment variables
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Invalid configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn ci_client(config: &Config) -> Arc<dyn ContinuousIntegrationServer> {
    match config.ci_backend {
        CiBackend::Jenkins => {
            let mut client = JenkinsClient::new(config.ci_url.clone(), config.version_control);
            if let (Some(username), Some(password)) = (&config.ci_username, &config.ci_password) {
                client = client.with_credentials(username.clone(), password.clone());
            }
            Arc::new(client)
        }
        CiBackend::Gitlab => {
            let mut client = GitlabClient::new(config.ci_url.clone());
            if let Some(token) = &config.ci_token {
                client = client.with_token(token.clone());
            }
            Arc::new(client)
        }
    }
}

/// Postgres when a database is configured, logging otherwise
async fn test_results_recorder(config: &Config) -> Result<Arc<dyn TestResultsRecorder>> {
    let Some(database_url) = &config.database_url else {
        info!("No DATABASE_URL set, test results will only be logged");
        return Ok(Arc::new(LoggingRecorder));
    };

    info!("Connecting to database...");

    let pool = db::create_pool(database_url)
        .await
        .context("Failed to create database pool")?;

    info!("Database connection pool created");

    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(Arc::new(PgTestResultsRecorder::new(pool)))
}
