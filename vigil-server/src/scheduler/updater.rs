//! Update pass

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, error, info, warn};
use vigil_client::ContinuousIntegrationServer;
use vigil_core::domain::tracked::TrackedJob;
use vigil_core::dto::test_results::TestResultRecord;

use crate::bus::{BusError, MessageBus};
use crate::registry::JobRegistry;
use crate::service::TestResultsRecorder;

/// Polls every tracked job and publishes what changed
pub struct JobUpdater {
    ci: Arc<dyn ContinuousIntegrationServer>,
    registry: Arc<JobRegistry>,
    bus: MessageBus,
    recorder: Arc<dyn TestResultsRecorder>,
}

impl JobUpdater {
    pub fn new(
        ci: Arc<dyn ContinuousIntegrationServer>,
        registry: Arc<JobRegistry>,
        bus: MessageBus,
        recorder: Arc<dyn TestResultsRecorder>,
    ) -> Self {
        Self {
            ci,
            registry,
            bus,
            recorder,
        }
    }

    /// Runs one update pass over every tracked job
    ///
    /// A failing or panicking job is logged and skipped. A frame the bus
    /// cannot accept ends the pass with an error.
    pub async fn run_once(&self) -> Result<(), BusError> {
        for job in self.registry.all_jobs() {
            let outcome = AssertUnwindSafe(self.update_job(&job)).catch_unwind().await;
            match outcome {
                Ok(result) => result?,
                Err(panic) => error!(
                    job = job.name(),
                    "Panicked while processing job: {}",
                    panic_message(panic.as_ref())
                ),
            }
        }
        Ok(())
    }

    async fn update_job(&self, job: &TrackedJob) -> Result<(), BusError> {
        let name = job.name();

        let snapshot = match self.ci.latest_build_info(name, job.status()).await {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_not_found() => {
                info!(job = name, "Job no longer exists, removing it");
                self.registry.remove(name);
                return self.bus.job_removed(name);
            }
            Err(e) if e.is_no_build_yet() => {
                debug!(job = name, "Job has not built yet");
                return Ok(());
            }
            Err(e) => {
                warn!(
                    job = name,
                    "Received status code {} while obtaining build info: {}",
                    e.status_code(),
                    e
                );
                return Ok(());
            }
        };

        let timestamp = snapshot.timestamp;
        let duration = snapshot.duration;
        let test_results = snapshot.test_results;

        if !job.apply_update(snapshot) {
            return Ok(());
        }
        self.bus.send_update(job)?;

        if job.has_just_completed() && job.should_persist_test_results() {
            let record = TestResultRecord::new(
                name,
                job.current().revision(),
                test_results,
                timestamp,
                duration,
            );
            self.recorder.record(record).await;
        }

        Ok(())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
