//! Dashboard figures derived from the task collection.

use crate::model::task::{Task, TaskStatus};
use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Task counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub total: usize,
    pub completed: usize,
    pub delayed: usize,
    /// Not completed, deadline within `[today, today + due_soon_days]`.
    pub due_soon: usize,
}

/// Counts `tasks` as of `today`.
pub fn summarize(tasks: &[Task], today: NaiveDate, due_soon_days: u32) -> TaskSummary {
    let horizon = today
        .checked_add_days(Days::new(u64::from(due_soon_days)))
        .unwrap_or(NaiveDate::MAX);

    tasks.iter().fold(TaskSummary::default(), |mut summary, task| {
        summary.total += 1;
        match task.status() {
            TaskStatus::Completed => summary.completed += 1,
            TaskStatus::Delayed => summary.delayed += 1,
            _ => {}
        }
        if task.status() != TaskStatus::Completed
            && task.deadline() >= today
            && task.deadline() <= horizon
        {
            summary.due_soon += 1;
        }
        summary
    })
}
