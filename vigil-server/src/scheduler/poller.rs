//! Polling loop
//!
//! One task runs both passes. Each pass is awaited inside the loop, so a slow
//! pass delays the next tick instead of overlapping it.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::bus::BusError;
use crate::scheduler::{JobFinder, JobUpdater};

pub struct Poller {
    finder: JobFinder,
    updater: JobUpdater,
    discovery_interval: Duration,
    update_interval: Duration,
}

impl Poller {
    pub fn new(
        finder: JobFinder,
        updater: JobUpdater,
        discovery_interval: Duration,
        update_interval: Duration,
    ) -> Self {
        Self {
            finder,
            updater,
            discovery_interval,
            update_interval,
        }
    }

    /// Runs both passes until shutdown
    ///
    /// Discovery runs first on start-up so the first update pass already has
    /// jobs to poll. Returns an error when the message bus rejects a frame.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), BusError> {
        info!(
            "Starting poller (discovery: {:?}, updates: {:?})",
            self.discovery_interval, self.update_interval
        );

        let mut discovery = time::interval(self.discovery_interval);
        discovery.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut updates = time::interval(self.update_interval);
        updates.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Poller shutting down");
                    return Ok(());
                }
                _ = discovery.tick() => {
                    self.finder.run_once().await;
                }
                _ = updates.tick() => {
                    self.updater.run_once().await?;
                }
            }
        }
    }
}
