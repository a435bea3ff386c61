//! Snapshot restore and save rules.
//!
//! # Responsibility
//! - Rebuild a consistent planner state from gateway records.
//! - Flatten the planner state into gateway records.
//!
//! # Invariants
//! - Restore never fails on bad records: each one is skipped with a warning
//!   and counted in `RestoreReport`. Only gateway failures are errors.
//! - Category and priority names resolve by exact match.
//! - Reminders dated before today are discarded, not re-derived.

use super::planner_service::PlannerState;
use crate::model::category::Category;
use crate::model::priority::{Priority, DEFAULT_PRIORITY_NAME};
use crate::model::reminder::{Reminder, ReminderType};
use crate::model::task::{Task, TaskId};
use crate::model::names_match;
use crate::repo::snapshot_repo::{
    CategoryRecord, PriorityRecord, ReminderRecord, RepoResult, SnapshotRepository, TaskRecord,
};
use chrono::NaiveDate;
use log::warn;
use serde::Serialize;
use uuid::Uuid;

/// What a snapshot restore kept and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub categories: usize,
    pub priorities: usize,
    pub tasks: usize,
    pub reminders: usize,
    /// Blank or duplicate category names.
    pub skipped_categories: usize,
    /// Blank or duplicate priority names; a stored Default is not counted.
    pub skipped_priorities: usize,
    /// Unknown category, blank text or duplicate id.
    pub skipped_tasks: usize,
    /// Tasks whose stored priority name matched nothing.
    pub defaulted_priorities: usize,
    /// Tasks whose stored id was not a UUID.
    pub regenerated_ids: usize,
    /// Reminders dated before the restore day.
    pub discarded_reminders: usize,
    /// Reminders failing a reminder invariant.
    pub skipped_reminders: usize,
    /// Tasks moved to `Delayed` by the closing sweep.
    pub delayed: usize,
}

/// Loads every collection from `repo` into a fresh state.
pub(crate) fn restore_state(
    repo: &(impl SnapshotRepository + ?Sized),
    today: NaiveDate,
) -> RepoResult<(PlannerState, RestoreReport)> {
    let category_records = repo.load_categories()?;
    let priority_records = repo.load_priorities()?;
    let task_records = repo.load_tasks()?;

    let mut state = PlannerState::default();
    let mut report = RestoreReport::default();

    for record in &category_records {
        restore_category(&mut state, record, &mut report);
    }
    for record in &priority_records {
        restore_priority(&mut state, record, &mut report);
    }
    for record in &task_records {
        restore_task(&mut state, record, today, &mut report);
    }

    report.delayed = state.tasks.update_delayed_tasks(today);
    Ok((state, report))
}

fn restore_category(state: &mut PlannerState, record: &CategoryRecord, report: &mut RestoreReport) {
    let restored = Category::new(record.name.as_str())
        .map_err(Into::into)
        .and_then(|category| state.categories.add(category));
    match restored {
        Ok(_) => report.categories += 1,
        Err(err) => {
            report.skipped_categories += 1;
            warn!(
                "event=snapshot_restore module=service status=skip entity=category error_code={}",
                err.code()
            );
        }
    }
}

fn restore_priority(state: &mut PlannerState, record: &PriorityRecord, report: &mut RestoreReport) {
    if names_match(record.name.trim(), DEFAULT_PRIORITY_NAME) {
        return;
    }
    let restored = Priority::new(record.name.as_str())
        .map_err(Into::into)
        .and_then(|priority| state.priorities.add(priority));
    match restored {
        Ok(_) => report.priorities += 1,
        Err(err) => {
            report.skipped_priorities += 1;
            warn!(
                "event=snapshot_restore module=service status=skip entity=priority error_code={}",
                err.code()
            );
        }
    }
}

fn restore_task(
    state: &mut PlannerState,
    record: &TaskRecord,
    today: NaiveDate,
    report: &mut RestoreReport,
) {
    let Some(category) = state.categories.find_by_name(&record.category) else {
        report.skipped_tasks += 1;
        warn!(
            "event=snapshot_restore module=service status=skip entity=task error_code=unknown_category"
        );
        return;
    };
    let category = category.id();

    let priority = state
        .priorities
        .find_by_name(&record.priority)
        .map(Priority::id);
    if priority.is_none() {
        report.defaulted_priorities += 1;
    }

    let id = Uuid::parse_str(&record.id).unwrap_or_else(|_| {
        report.regenerated_ids += 1;
        Uuid::new_v4()
    });

    let restored = Task::restore(
        id,
        record.title.as_str(),
        record.description.as_str(),
        category,
        priority,
        record.deadline,
        record.status,
    )
    .map_err(Into::into)
    .and_then(|task| state.tasks.add(task, &state.priorities));

    let task_id = match restored {
        Ok(task_id) => task_id,
        Err(err) => {
            report.skipped_tasks += 1;
            warn!(
                "event=snapshot_restore module=service status=skip entity=task error_code={}",
                err.code()
            );
            return;
        }
    };
    report.tasks += 1;

    for reminder in &record.reminders {
        restore_reminder(state, task_id, reminder, today, report);
    }
}

fn restore_reminder(
    state: &mut PlannerState,
    task_id: TaskId,
    record: &ReminderRecord,
    today: NaiveDate,
    report: &mut RestoreReport,
) {
    if record.date < today {
        report.discarded_reminders += 1;
        return;
    }

    let custom_date = (record.kind == ReminderType::CustomDate).then_some(record.date);
    let built = match state.tasks.get(task_id) {
        Some(task) => Reminder::new(record.kind, task, custom_date, today).map_err(Into::into),
        None => return,
    };
    let restored = built.and_then(|reminder| state.reminders.add(&mut state.tasks, reminder, today));

    match restored {
        Ok(_) => report.reminders += 1,
        Err(err) => {
            report.skipped_reminders += 1;
            warn!(
                "event=snapshot_restore module=service status=skip entity=reminder task_id={} error_code={}",
                task_id,
                err.code()
            );
        }
    }
}

/// Records for a full save, in store order.
pub(crate) fn snapshot_records(
    state: &PlannerState,
) -> (Vec<CategoryRecord>, Vec<PriorityRecord>, Vec<TaskRecord>) {
    let categories = state
        .categories
        .all()
        .iter()
        .map(|category| CategoryRecord {
            name: category.name().to_string(),
        })
        .collect();

    let priorities = state
        .priorities
        .all()
        .iter()
        .map(|priority| PriorityRecord {
            name: priority.name().to_string(),
        })
        .collect();

    let tasks = state
        .tasks
        .all()
        .iter()
        .map(|task| TaskRecord {
            id: task.id().to_string(),
            title: task.title().to_string(),
            description: task.description().to_string(),
            category: state
                .categories
                .get(task.category())
                .map(|category| category.name().to_string())
                .unwrap_or_default(),
            priority: task
                .priority()
                .and_then(|id| state.priorities.get(id))
                .or_else(|| state.priorities.default_priority())
                .map(|priority| priority.name().to_string())
                .unwrap_or_else(|| DEFAULT_PRIORITY_NAME.to_string()),
            deadline: task.deadline(),
            status: task.status(),
            reminders: task
                .reminders()
                .iter()
                .map(|reminder| ReminderRecord {
                    kind: reminder.kind(),
                    date: reminder.date(),
                })
                .collect(),
        })
        .collect();

    (categories, priorities, tasks)
}
