//! Planner use-case layer.
//!
//! # Responsibility
//! - Expose the presentation-facing operations over the four stores.
//! - Restore and save snapshots through a `SnapshotRepository`.
//! - Derive read-only dashboard figures.

pub mod planner_service;
pub mod snapshot;
pub mod summary;
