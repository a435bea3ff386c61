//! Persistence gateway for planner snapshots.
//!
//! # Responsibility
//! - Define the snapshot record shapes exchanged with storage.
//! - Provide SQLite and JSON-file implementations behind one trait.
//!
//! # Invariants
//! - Records reference categories and priorities by name, never by id.
//! - A save replaces the whole stored collection of its kind.

pub mod json_snapshot_repo;
pub mod snapshot_repo;
