//! Data Transfer Objects
//!
//! Lightweight representations of domain entities as they leave the core:
//! job descriptors returned by discovery, publishable jobs and wire frames
//! sent to dashboards, and test-result records handed to persistence.

pub mod frame;
pub mod job;
pub mod test_results;
