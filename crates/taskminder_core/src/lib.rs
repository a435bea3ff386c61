//! Core domain logic for Taskminder.
//! This crate is the single source of truth for task, reminder, category and
//! priority invariants.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{Category, CategoryId};
pub use model::priority::{Priority, PriorityId, DEFAULT_PRIORITY_NAME};
pub use model::reminder::{Reminder, ReminderId, ReminderType, ReminderValidationError};
pub use model::task::{Task, TaskId, TaskStatus, TaskUpdate, TaskValidationError};
pub use model::BlankNameError;
pub use repo::json_snapshot_repo::JsonSnapshotRepository;
pub use repo::snapshot_repo::{
    CategoryRecord, PriorityRecord, ReminderRecord, RepoError, RepoResult, SnapshotRepository,
    SqliteSnapshotRepository, TaskRecord,
};
pub use service::planner_service::{NewTask, PlannerService, PlannerSettings};
pub use service::snapshot::RestoreReport;
pub use service::summary::TaskSummary;
pub use store::category_store::CategoryStore;
pub use store::priority_store::PriorityStore;
pub use store::reminder_store::ReminderStore;
pub use store::task_store::{TaskQuery, TaskStore};
pub use store::{EntityKind, ErrorKind, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
