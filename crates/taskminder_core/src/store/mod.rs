//! In-memory entity stores and their cascade rules.
//!
//! # Responsibility
//! - Own the category, priority, task and reminder collections.
//! - Keep the collections mutually consistent across cascading edits.
//!
//! # Invariants
//! - Every operation validates before it mutates; a returned error means no
//!   state changed. The exceptions are the two reminder-index repairs:
//!   - `ReminderStore::add` re-attaches a tracked reminder missing from its
//!     task, or drops the stale entry when the reminder no longer validates;
//!   - `ReminderStore::remove` drops a stale entry and reports `NotFound`.
//! - Stores never hold each other. Collaborating stores are passed in by the
//!   caller for each cascading operation.
//! - Reminders are owned by their task; `ReminderStore` is an index over them.

pub mod category_store;
pub mod priority_store;
pub mod reminder_store;
pub mod task_store;

use crate::model::reminder::{ReminderId, ReminderValidationError};
use crate::model::task::{TaskId, TaskValidationError};
use crate::model::BlankNameError;
use log::warn;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity label carried by store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Category,
    Priority,
    Task,
    Reminder,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Category => "category",
            Self::Priority => "priority",
            Self::Task => "task",
            Self::Reminder => "reminder",
        };
        f.write_str(label)
    }
}

/// Stable error classification for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Blank/missing required input.
    InvalidArgument,
    /// Duplicate name or entity.
    Uniqueness,
    /// Operation on an entity the store does not track.
    UnknownEntity,
    /// Date, status or reminder rule broken.
    InvariantViolation,
    /// Rename/remove of the Default priority.
    ProtectedEntity,
}

/// Error returned by every store operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    BlankName(#[from] BlankNameError),
    #[error(transparent)]
    Task(#[from] TaskValidationError),
    #[error(transparent)]
    Reminder(#[from] ReminderValidationError),
    #[error("{entity} name `{name}` is already in use")]
    DuplicateName { entity: EntityKind, name: String },
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: EntityKind, id: Uuid },
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: Uuid },
    #[error("the default priority cannot be {action}")]
    ProtectedPriority { action: &'static str },
    #[error("reminder {reminder_id} was tracked but missing from task {task_id}; task reminders repaired")]
    ReminderIndexRepaired {
        reminder_id: ReminderId,
        task_id: TaskId,
    },
    #[error("reminder {reminder_id} belongs to task {owner}, not {task_id}")]
    ReminderOwnerMismatch {
        reminder_id: ReminderId,
        owner: TaskId,
        task_id: TaskId,
    },
}

impl StoreError {
    pub(crate) fn not_found(entity: EntityKind, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    /// Maps this error onto the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BlankName(_) => ErrorKind::InvalidArgument,
            Self::Task(TaskValidationError::BlankTitle | TaskValidationError::BlankDescription) => {
                ErrorKind::InvalidArgument
            }
            Self::Task(_) => ErrorKind::InvariantViolation,
            Self::Reminder(ReminderValidationError::CustomDateRequired) => {
                ErrorKind::InvalidArgument
            }
            Self::Reminder(_) => ErrorKind::InvariantViolation,
            Self::DuplicateName { .. }
            | Self::AlreadyExists { .. }
            | Self::ReminderIndexRepaired { .. } => ErrorKind::Uniqueness,
            Self::NotFound { .. } => ErrorKind::UnknownEntity,
            Self::ProtectedPriority { .. } => ErrorKind::ProtectedEntity,
            Self::ReminderOwnerMismatch { .. } => ErrorKind::InvalidArgument,
        }
    }

    /// Stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BlankName(_) => "blank_name",
            Self::Task(TaskValidationError::BlankTitle) => "blank_title",
            Self::Task(TaskValidationError::BlankDescription) => "blank_description",
            Self::Task(TaskValidationError::DeadlineInPast { .. }) => "deadline_in_past",
            Self::Task(TaskValidationError::DelayedDeadlineMovedIntoPast { .. }) => {
                "delayed_deadline_moved_into_past"
            }
            Self::Task(TaskValidationError::DelayedStatusLocked { .. }) => "delayed_status_locked",
            Self::Task(TaskValidationError::DelayedRequiresPastDeadline { .. }) => {
                "delayed_requires_past_deadline"
            }
            Self::Reminder(ReminderValidationError::TaskCompleted) => "task_completed",
            Self::Reminder(ReminderValidationError::CustomDateRequired) => "custom_date_required",
            Self::Reminder(ReminderValidationError::DateOutOfRange { .. }) => "date_out_of_range",
            Self::Reminder(ReminderValidationError::DateInPast { .. }) => "reminder_in_past",
            Self::Reminder(ReminderValidationError::AfterDeadline { .. }) => {
                "reminder_after_deadline"
            }
            Self::Reminder(ReminderValidationError::DuplicateDate { .. }) => {
                "reminder_duplicate_date"
            }
            Self::DuplicateName { .. } => "duplicate_name",
            Self::AlreadyExists { .. } => "already_exists",
            Self::NotFound { .. } => "not_found",
            Self::ProtectedPriority { .. } => "protected_priority",
            Self::ReminderIndexRepaired { .. } => "reminder_index_repaired",
            Self::ReminderOwnerMismatch { .. } => "reminder_owner_mismatch",
        }
    }
}

/// Emits the rejection line shared by all store operations.
pub(crate) fn log_rejected(event: &str, err: &StoreError) {
    warn!(
        "event={} module=store status=error error_code={}",
        event,
        err.code()
    );
}
