//! Test Results Repository
//!
//! Handles all database operations related to recorded test results.

use sqlx::PgPool;
use vigil_core::dto::test_results::TestResultRecord;

/// Store the test results of one completed build
pub async fn insert(pool: &PgPool, record: &TestResultRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO job_test_results
            (job_name, revision, total, pass_count, fail_count, start_time, duration_ms)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(&record.job_name)
    .bind(&record.revision)
    .bind(i64::from(record.total))
    .bind(i64::from(record.pass_count))
    .bind(i64::from(record.fail_count))
    .bind(record.start_time)
    .bind(record.duration_ms)
    .execute(pool)
    .await?;

    Ok(())
}
