//! Scheduler module
//!
//! Drives the two periodic passes over the CI backend: discovery finds new
//! jobs, updates poll every tracked job and publish what changed.

mod discovery;
mod poller;
mod updater;

#[cfg(test)]
mod testing;

pub use discovery::JobFinder;
pub use poller::Poller;
pub use updater::JobUpdater;
