//! Test result recording
//!
//! The scheduler hands every completed build of a persisting job to a
//! `TestResultsRecorder`. Recording never fails from the caller's point of
//! view: implementations log their own errors.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use vigil_core::dto::test_results::TestResultRecord;

use crate::repository::test_results_repository;

#[async_trait]
pub trait TestResultsRecorder: Send + Sync {
    async fn record(&self, record: TestResultRecord);
}

/// Stores records in Postgres
pub struct PgTestResultsRecorder {
    pool: PgPool,
}

impl PgTestResultsRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TestResultsRecorder for PgTestResultsRecorder {
    async fn record(&self, record: TestResultRecord) {
        match test_results_repository::insert(&self.pool, &record).await {
            Ok(()) => info!(
                job = %record.job_name,
                "Stored test results for revision {} ({} tests, {} failed)",
                record.revision, record.total, record.fail_count
            ),
            Err(e) => error!(
                job = %record.job_name,
                "Failed to store test results: {:?}", e
            ),
        }
    }
}

/// Used when no database is configured
#[derive(Debug, Default)]
pub struct LoggingRecorder;

#[async_trait]
impl TestResultsRecorder for LoggingRecorder {
    async fn record(&self, record: TestResultRecord) {
        info!(
            job = %record.job_name,
            "Test results for revision {}: {} total, {} passed, {} failed, started {}, took {} ms",
            record.revision,
            record.total,
            record.pass_count,
            record.fail_count,
            record.start_time,
            record.duration_ms
        );
    }
}
