//! Vigil Core
//!
//! Core types and abstractions for the Vigil build monitor.
//!
//! This crate contains:
//! - Domain types: tracked jobs, build snapshots and the update state machine
//! - DTOs: what gets published to dashboards and handed to persistence

pub mod domain;
pub mod dto;
