use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // One row per completed build of a persisting job
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_test_results (
            id BIGSERIAL PRIMARY KEY,
            job_name VARCHAR(255) NOT NULL,
            revision VARCHAR(255) NOT NULL,
            total BIGINT NOT NULL,
            pass_count BIGINT NOT NULL,
            fail_count BIGINT NOT NULL,
            start_time TIMESTAMPTZ NOT NULL,
            duration_ms BIGINT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_job_test_results_job ON job_test_results(job_name, start_time DESC)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
