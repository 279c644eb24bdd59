//! Job registry
//!
//! The set of jobs currently tracked, keyed by name. Shared between the
//! scheduler, which adds, updates and removes jobs, and the transport, which
//! reads snapshots for new sessions.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use vigil_core::domain::tracked::TrackedJob;
use vigil_core::dto::job::PublishableJob;

/// Tracked jobs keyed by name
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, Arc<TrackedJob>>>,
    priorities: HashMap<String, i32>,
}

impl JobRegistry {
    /// Creates an empty registry with the configured priorities
    pub fn new(priorities: HashMap<String, i32>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            priorities,
        }
    }

    /// Adds a job, replacing any job with the same name
    pub fn add(&self, job: TrackedJob) -> Arc<TrackedJob> {
        let job = Arc::new(job);
        self.write().insert(job.name().to_string(), Arc::clone(&job));
        job
    }

    /// Removes a job; returns whether it was tracked
    pub fn remove(&self, name: &str) -> bool {
        self.write().remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<Arc<TrackedJob>> {
        self.read().get(name).cloned()
    }

    /// Every tracked job, in no particular order
    pub fn all_jobs(&self) -> Vec<Arc<TrackedJob>> {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Configured priority of a job, 0 when none was configured
    pub fn priority_for(&self, name: &str) -> i32 {
        self.priorities.get(name).copied().unwrap_or(0)
    }

    /// Dashboard view of every tracked job, in display order
    pub fn snapshot(&self) -> Vec<PublishableJob> {
        let mut jobs: Vec<PublishableJob> =
            self.read().values().map(|job| job.publishable()).collect();
        jobs.sort_by(display_order);
        jobs
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<TrackedJob>>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<TrackedJob>>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Dashboard ordering
///
/// Higher priority first. Among unprioritised jobs the more urgent status
/// comes first; everything else falls back to the job name.
pub fn display_order(a: &PublishableJob, b: &PublishableJob) -> Ordering {
    b.priority.cmp(&a.priority).then_with(|| {
        if a.priority == 0 && a.status.rank() != b.status.rank() {
            a.status.rank().cmp(&b.status.rank())
        } else {
            a.name.cmp(&b.name)
        }
    })
}
