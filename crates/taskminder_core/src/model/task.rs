//! Task domain model.
//!
//! # Responsibility
//! - Define the task record and its status lifecycle.
//! - Validate full-replacement updates before anything is applied.
//!
//! # Invariants
//! - `id` is generated once and never changes.
//! - `title` and `description` are non-blank.
//! - A freshly created task never has a deadline before today; restored tasks
//!   may (their status is allowed to lag behind the calendar).
//! - `status == Delayed` is only requested together with a past deadline.
//! - `reminders` is the source of truth for reminder ownership.

use super::category::CategoryId;
use super::priority::PriorityId;
use super::reminder::{Reminder, ReminderId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Created, not started.
    Open,
    /// Work is in progress.
    InProgress,
    /// Deliberately pushed back by the user.
    Postponed,
    /// Done. Completed tasks carry no reminders.
    Completed,
    /// Deadline passed before completion.
    Delayed,
}

impl TaskStatus {
    /// Stable wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Postponed => "POSTPONED",
            Self::Completed => "COMPLETED",
            Self::Delayed => "DELAYED",
        }
    }

    /// Parses the stable wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OPEN" => Some(Self::Open),
            "IN_PROGRESS" => Some(Self::InProgress),
            "POSTPONED" => Some(Self::Postponed),
            "COMPLETED" => Some(Self::Completed),
            "DELAYED" => Some(Self::Delayed),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task field or state-transition rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskValidationError {
    #[error("task title must not be blank")]
    BlankTitle,
    #[error("task description must not be blank")]
    BlankDescription,
    #[error("task deadline {deadline} is in the past (today is {today})")]
    DeadlineInPast { deadline: NaiveDate, today: NaiveDate },
    #[error(
        "a delayed task may only keep its past deadline {current} or move to a future one, got {requested}"
    )]
    DelayedDeadlineMovedIntoPast {
        current: NaiveDate,
        requested: NaiveDate,
    },
    #[error("a delayed task may only become COMPLETED unless its deadline changes, got {requested}")]
    DelayedStatusLocked { requested: TaskStatus },
    #[error("a task may only be marked DELAYED when its deadline {deadline} is before {today}")]
    DelayedRequiresPastDeadline { deadline: NaiveDate, today: NaiveDate },
}

/// Full replacement values for an existing task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: String,
    pub description: String,
    pub category: CategoryId,
    pub priority: PriorityId,
    pub deadline: NaiveDate,
    /// Requested status. The stored status may differ, see
    /// `TaskStore::update`.
    pub status: TaskStatus,
}

/// Validated form of a `TaskUpdate`, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedUpdate {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub deadline_changed: bool,
    pub completes: bool,
}

/// Actionable item with a deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    category: CategoryId,
    priority: Option<PriorityId>,
    deadline: NaiveDate,
    status: TaskStatus,
    reminders: Vec<Reminder>,
}

impl Task {
    /// Creates an `Open` task with a generated id.
    ///
    /// `priority = None` is resolved to the Default priority when the task is
    /// added to a `TaskStore`.
    ///
    /// # Errors
    /// - Blank title or description.
    /// - `deadline` before `today`.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: CategoryId,
        priority: Option<PriorityId>,
        deadline: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self, TaskValidationError> {
        if deadline < today {
            return Err(TaskValidationError::DeadlineInPast { deadline, today });
        }
        Self::restore(
            Uuid::new_v4(),
            title,
            description,
            category,
            priority,
            deadline,
            TaskStatus::Open,
        )
    }

    /// Rebuilds a persisted task.
    ///
    /// Skips the deadline-in-past check: a stored task may legitimately be
    /// overdue.
    pub fn restore(
        id: TaskId,
        title: impl Into<String>,
        description: impl Into<String>,
        category: CategoryId,
        priority: Option<PriorityId>,
        deadline: NaiveDate,
        status: TaskStatus,
    ) -> Result<Self, TaskValidationError> {
        Ok(Self {
            id,
            title: normalize_text(title.into(), TaskValidationError::BlankTitle)?,
            description: normalize_text(description.into(), TaskValidationError::BlankDescription)?,
            category,
            priority,
            deadline,
            status,
            reminders: Vec::new(),
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> CategoryId {
        self.category
    }

    /// `None` only before the task is added to a store.
    pub fn priority(&self) -> Option<PriorityId> {
        self.priority
    }

    pub fn deadline(&self) -> NaiveDate {
        self.deadline
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Reminders in the order they were attached.
    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn reminder(&self, id: ReminderId) -> Option<&Reminder> {
        self.reminders.iter().find(|reminder| reminder.id() == id)
    }

    /// Deadline passed and the task is not completed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.deadline < today && self.status != TaskStatus::Completed
    }

    /// Validates a full-replacement update against the current state.
    ///
    /// Rules, in evaluation order:
    /// 1. A delayed task may keep its past deadline or move to a date not
    ///    before `today`; any other task needs a deadline not before `today`.
    /// 2. A delayed task moved to a future deadline while still requesting
    ///    `Delayed` is downgraded to `Open`.
    /// 3. A delayed task whose deadline is unchanged may only stay `Delayed`
    ///    or become `Completed`.
    /// 4. `Delayed` requires a deadline before `today`.
    pub(crate) fn plan_update(
        &self,
        update: &TaskUpdate,
        today: NaiveDate,
    ) -> Result<PlannedUpdate, TaskValidationError> {
        let title = normalize_text(update.title.clone(), TaskValidationError::BlankTitle)?;
        let description = normalize_text(
            update.description.clone(),
            TaskValidationError::BlankDescription,
        )?;

        let was_delayed = self.status == TaskStatus::Delayed;
        let deadline_changed = update.deadline != self.deadline;
        let deadline_in_past = update.deadline < today;

        if was_delayed {
            if deadline_in_past && deadline_changed {
                return Err(TaskValidationError::DelayedDeadlineMovedIntoPast {
                    current: self.deadline,
                    requested: update.deadline,
                });
            }
        } else if deadline_in_past {
            return Err(TaskValidationError::DeadlineInPast {
                deadline: update.deadline,
                today,
            });
        }

        let mut status = update.status;
        if was_delayed && update.deadline > today && status == TaskStatus::Delayed {
            status = TaskStatus::Open;
        }

        if was_delayed
            && !deadline_changed
            && !matches!(status, TaskStatus::Completed | TaskStatus::Delayed)
        {
            return Err(TaskValidationError::DelayedStatusLocked { requested: status });
        }

        if status == TaskStatus::Delayed && !deadline_in_past {
            return Err(TaskValidationError::DelayedRequiresPastDeadline {
                deadline: update.deadline,
                today,
            });
        }

        Ok(PlannedUpdate {
            title,
            description,
            status,
            deadline_changed,
            completes: status == TaskStatus::Completed && self.status != TaskStatus::Completed,
        })
    }

    pub(crate) fn apply_update(&mut self, update: &TaskUpdate, plan: PlannedUpdate) {
        self.title = plan.title;
        self.description = plan.description;
        self.category = update.category;
        self.priority = Some(update.priority);
        self.deadline = update.deadline;
        self.status = plan.status;
    }

    pub(crate) fn assign_priority(&mut self, priority: PriorityId) {
        self.priority = Some(priority);
    }

    pub(crate) fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    pub(crate) fn attach_reminder(&mut self, reminder: Reminder) {
        self.reminders.push(reminder);
    }

    pub(crate) fn detach_reminder(&mut self, id: ReminderId) -> Option<Reminder> {
        let position = self
            .reminders
            .iter()
            .position(|reminder| reminder.id() == id)?;
        Some(self.reminders.remove(position))
    }

    pub(crate) fn take_reminders(&mut self) -> Vec<Reminder> {
        std::mem::take(&mut self.reminders)
    }

    pub(crate) fn reminder_mut(&mut self, id: ReminderId) -> Option<&mut Reminder> {
        self.reminders.iter_mut().find(|reminder| reminder.id() == id)
    }
}

fn normalize_text(value: String, blank: TaskValidationError) -> Result<String, TaskValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(blank);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskStatus, TaskUpdate, TaskValidationError};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn update_for(task: &Task, deadline: NaiveDate, status: TaskStatus) -> TaskUpdate {
        TaskUpdate {
            title: task.title().to_string(),
            description: task.description().to_string(),
            category: task.category(),
            priority: Uuid::new_v4(),
            deadline,
            status,
        }
    }

    #[test]
    fn new_rejects_past_deadline_and_blank_fields() {
        let category = Uuid::new_v4();
        assert_eq!(
            Task::new("t", "d", category, None, day(9), day(10)).unwrap_err(),
            TaskValidationError::DeadlineInPast {
                deadline: day(9),
                today: day(10)
            }
        );
        assert_eq!(
            Task::new(" ", "d", category, None, day(10), day(10)).unwrap_err(),
            TaskValidationError::BlankTitle
        );
        assert_eq!(
            Task::new("t", "", category, None, day(10), day(10)).unwrap_err(),
            TaskValidationError::BlankDescription
        );
    }

    #[test]
    fn new_task_starts_open_without_reminders() {
        let task = Task::new("Report", "Quarterly", Uuid::new_v4(), None, day(12), day(10)).unwrap();
        assert_eq!(task.status(), TaskStatus::Open);
        assert!(task.reminders().is_empty());
        assert!(task.priority().is_none());
    }

    #[test]
    fn status_wire_names_roundtrip() {
        for status in [
            TaskStatus::Open,
            TaskStatus::InProgress,
            TaskStatus::Postponed,
            TaskStatus::Completed,
            TaskStatus::Delayed,
        ] {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("open"), None);
    }

    #[test]
    fn plan_update_downgrades_delayed_task_moved_to_future() {
        let task = Task::restore(
            Uuid::new_v4(),
            "t",
            "d",
            Uuid::new_v4(),
            None,
            day(9),
            TaskStatus::Delayed,
        )
        .unwrap();

        let plan = task
            .plan_update(&update_for(&task, day(11), TaskStatus::Delayed), day(10))
            .unwrap();
        assert_eq!(plan.status, TaskStatus::Open);
        assert!(plan.deadline_changed);
    }

    #[test]
    fn plan_update_rejects_delayed_for_future_deadline() {
        let task = Task::new("t", "d", Uuid::new_v4(), None, day(12), day(10)).unwrap();
        let err = task
            .plan_update(&update_for(&task, day(12), TaskStatus::Delayed), day(10))
            .unwrap_err();
        assert_eq!(
            err,
            TaskValidationError::DelayedRequiresPastDeadline {
                deadline: day(12),
                today: day(10)
            }
        );
    }
}
