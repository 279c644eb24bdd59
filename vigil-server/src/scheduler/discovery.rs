//! Discovery pass

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info};
use vigil_client::ContinuousIntegrationServer;
use vigil_core::domain::tracked::{JobSettings, TrackedJob};

use crate::registry::JobRegistry;

/// Adds jobs the backend knows about but the registry doesn't
pub struct JobFinder {
    ci: Arc<dyn ContinuousIntegrationServer>,
    registry: Arc<JobRegistry>,
    persist_test_results: HashSet<String>,
    display_comments: HashSet<String>,
}

impl JobFinder {
    pub fn new(
        ci: Arc<dyn ContinuousIntegrationServer>,
        registry: Arc<JobRegistry>,
        persist_test_results: HashSet<String>,
        display_comments: HashSet<String>,
    ) -> Self {
        Self {
            ci,
            registry,
            persist_test_results,
            display_comments,
        }
    }

    fn settings_for(&self, name: &str) -> JobSettings {
        JobSettings {
            priority: self.registry.priority_for(name),
            persist_test_results: self.persist_test_results.contains(name),
            display_comments: self.display_comments.contains(name),
        }
    }

    /// Runs one discovery pass, returning how many jobs were added
    ///
    /// A failed listing leaves the registry untouched until the next pass.
    pub async fn run_once(&self) -> usize {
        let descriptors = match self.ci.list_jobs().await {
            Ok(descriptors) => descriptors,
            Err(e) => {
                error!(
                    "Received status code {} when trying to obtain jobs: {}",
                    e.status_code(),
                    e
                );
                return 0;
            }
        };

        let mut added = 0;
        for descriptor in descriptors {
            if self.registry.contains(&descriptor.name) {
                continue;
            }

            let settings = self.settings_for(&descriptor.name);
            info!(
                job = %descriptor.name,
                priority = settings.priority,
                "Tracking new job"
            );
            self.registry
                .add(TrackedJob::new(descriptor.into_job(), settings));
            added += 1;
        }

        debug!("Discovery added {} job(s), tracking {}", added, self.registry.len());
        added
    }
}
