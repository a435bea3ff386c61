//! Reminder domain model.
//!
//! # Responsibility
//! - Derive reminder dates from a task deadline for relative types.
//! - Validate every proposed `(type, date)` pair against the owning task.
//!
//! # Invariants
//! - `task_id` is fixed at construction; a reminder is never reassigned.
//! - The owning task is not `Completed`.
//! - `today <= date <= task.deadline`.
//! - No two reminders of one task share a date.

use super::task::{Task, TaskId, TaskStatus};
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Stable reminder identifier.
pub type ReminderId = Uuid;

/// How a reminder date is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderType {
    OneDayBefore,
    OneWeekBefore,
    OneMonthBefore,
    /// User-supplied date, not tied to deadline arithmetic.
    CustomDate,
}

impl ReminderType {
    /// Returns whether the date follows the task deadline.
    pub fn is_relative(self) -> bool {
        self != Self::CustomDate
    }

    /// Date a relative reminder falls on for `deadline`.
    ///
    /// Month arithmetic clamps to the last day of the target month.
    /// Returns `None` for `CustomDate` and on calendar underflow.
    pub fn date_for_deadline(self, deadline: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::OneDayBefore => deadline.checked_sub_days(Days::new(1)),
            Self::OneWeekBefore => deadline.checked_sub_days(Days::new(7)),
            Self::OneMonthBefore => deadline.checked_sub_months(Months::new(1)),
            Self::CustomDate => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneDayBefore => "ONE_DAY_BEFORE",
            Self::OneWeekBefore => "ONE_WEEK_BEFORE",
            Self::OneMonthBefore => "ONE_MONTH_BEFORE",
            Self::CustomDate => "CUSTOM_DATE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ONE_DAY_BEFORE" => Some(Self::OneDayBefore),
            "ONE_WEEK_BEFORE" => Some(Self::OneWeekBefore),
            "ONE_MONTH_BEFORE" => Some(Self::OneMonthBefore),
            "CUSTOM_DATE" => Some(Self::CustomDate),
            _ => None,
        }
    }
}

impl fmt::Display for ReminderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reminder invariant violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderValidationError {
    #[error("cannot attach reminders to a completed task")]
    TaskCompleted,
    #[error("custom reminders must have a specific date")]
    CustomDateRequired,
    #[error("no {kind} date exists for deadline {deadline}")]
    DateOutOfRange { kind: ReminderType, deadline: NaiveDate },
    #[error("reminder date {date} is in the past (today is {today})")]
    DateInPast { date: NaiveDate, today: NaiveDate },
    #[error("reminder date {date} for type {kind} is after task deadline {deadline}")]
    AfterDeadline {
        date: NaiveDate,
        kind: ReminderType,
        deadline: NaiveDate,
    },
    #[error("a reminder with the date {date} already exists for this task")]
    DuplicateDate { date: NaiveDate },
}

/// Dated note attached to exactly one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    id: ReminderId,
    task_id: TaskId,
    kind: ReminderType,
    date: NaiveDate,
}

impl Reminder {
    /// Creates a reminder for `task`.
    ///
    /// Relative types derive their date from the task deadline and ignore
    /// `custom_date`; `CustomDate` requires it.
    pub fn new(
        kind: ReminderType,
        task: &Task,
        custom_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, ReminderValidationError> {
        let id = Uuid::new_v4();
        Self::build(id, kind, task, custom_date, today, Some(id))
    }

    /// Builds and validates a reminder with a known id.
    ///
    /// `ignore` names a reminder of `task` excluded from the duplicate-date
    /// check (the one being replaced or rebuilt).
    pub(crate) fn build(
        id: ReminderId,
        kind: ReminderType,
        task: &Task,
        custom_date: Option<NaiveDate>,
        today: NaiveDate,
        ignore: Option<ReminderId>,
    ) -> Result<Self, ReminderValidationError> {
        let date = resolve_date(kind, task.deadline(), custom_date)?;
        validate_proposed(task, ignore, kind, date, today)?;
        Ok(Self {
            id,
            task_id: task.id(),
            kind,
            date,
        })
    }

    pub fn id(&self) -> ReminderId {
        self.id
    }

    /// Owning task.
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn kind(&self) -> ReminderType {
        self.kind
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Overwrites type and date together; callers validate first.
    pub(crate) fn apply(&mut self, kind: ReminderType, date: NaiveDate) {
        self.kind = kind;
        self.date = date;
    }
}

/// Resolves the date a reminder of `kind` would carry under `deadline`.
pub(crate) fn resolve_date(
    kind: ReminderType,
    deadline: NaiveDate,
    custom_date: Option<NaiveDate>,
) -> Result<NaiveDate, ReminderValidationError> {
    if kind == ReminderType::CustomDate {
        return custom_date.ok_or(ReminderValidationError::CustomDateRequired);
    }
    kind.date_for_deadline(deadline)
        .ok_or(ReminderValidationError::DateOutOfRange { kind, deadline })
}

/// Checks every reminder invariant for a proposed `(kind, date)` on `task`.
pub(crate) fn validate_proposed(
    task: &Task,
    ignore: Option<ReminderId>,
    kind: ReminderType,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<(), ReminderValidationError> {
    if task.status() == TaskStatus::Completed {
        return Err(ReminderValidationError::TaskCompleted);
    }
    if date < today {
        return Err(ReminderValidationError::DateInPast { date, today });
    }
    if date > task.deadline() {
        return Err(ReminderValidationError::AfterDeadline {
            date,
            kind,
            deadline: task.deadline(),
        });
    }
    let taken = task
        .reminders()
        .iter()
        .filter(|existing| Some(existing.id()) != ignore)
        .any(|existing| existing.date() == date);
    if taken {
        return Err(ReminderValidationError::DuplicateDate { date });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Reminder, ReminderType, ReminderValidationError};
    use crate::model::task::{Task, TaskStatus};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task_due(deadline: NaiveDate, status: TaskStatus) -> Task {
        Task::restore(Uuid::new_v4(), "t", "d", Uuid::new_v4(), None, deadline, status).unwrap()
    }

    #[test]
    fn relative_types_derive_from_deadline() {
        let deadline = date(2026, 5, 20);
        assert_eq!(
            ReminderType::OneDayBefore.date_for_deadline(deadline),
            Some(date(2026, 5, 19))
        );
        assert_eq!(
            ReminderType::OneWeekBefore.date_for_deadline(deadline),
            Some(date(2026, 5, 13))
        );
        assert_eq!(
            ReminderType::OneMonthBefore.date_for_deadline(deadline),
            Some(date(2026, 4, 20))
        );
        assert_eq!(ReminderType::CustomDate.date_for_deadline(deadline), None);
    }

    #[test]
    fn one_month_before_clamps_to_month_end() {
        assert_eq!(
            ReminderType::OneMonthBefore.date_for_deadline(date(2026, 3, 31)),
            Some(date(2026, 2, 28))
        );
    }

    #[test]
    fn new_relative_reminder_ignores_custom_date() {
        let task = task_due(date(2026, 5, 20), TaskStatus::Open);
        let reminder = Reminder::new(
            ReminderType::OneWeekBefore,
            &task,
            Some(date(2026, 5, 1)),
            date(2026, 5, 1),
        )
        .unwrap();
        assert_eq!(reminder.date(), date(2026, 5, 13));
        assert_eq!(reminder.task_id(), task.id());
    }

    #[test]
    fn custom_reminder_requires_date() {
        let task = task_due(date(2026, 5, 20), TaskStatus::Open);
        let err = Reminder::new(ReminderType::CustomDate, &task, None, date(2026, 5, 1)).unwrap_err();
        assert_eq!(err, ReminderValidationError::CustomDateRequired);
    }

    #[test]
    fn validation_rejects_completed_past_and_late_dates() {
        let today = date(2026, 5, 10);
        let completed = task_due(date(2026, 5, 20), TaskStatus::Completed);
        assert_eq!(
            Reminder::new(ReminderType::OneDayBefore, &completed, None, today).unwrap_err(),
            ReminderValidationError::TaskCompleted
        );

        let open = task_due(date(2026, 5, 20), TaskStatus::Open);
        assert_eq!(
            Reminder::new(ReminderType::OneMonthBefore, &open, None, today).unwrap_err(),
            ReminderValidationError::DateInPast {
                date: date(2026, 4, 20),
                today
            }
        );
        assert!(matches!(
            Reminder::new(ReminderType::CustomDate, &open, Some(date(2026, 5, 21)), today),
            Err(ReminderValidationError::AfterDeadline { .. })
        ));
        assert!(Reminder::new(ReminderType::CustomDate, &open, Some(date(2026, 5, 20)), today).is_ok());
    }

    #[test]
    fn type_wire_names_roundtrip() {
        for kind in [
            ReminderType::OneDayBefore,
            ReminderType::OneWeekBefore,
            ReminderType::OneMonthBefore,
            ReminderType::CustomDate,
        ] {
            assert_eq!(ReminderType::parse(kind.as_str()), Some(kind));
        }
    }
}
