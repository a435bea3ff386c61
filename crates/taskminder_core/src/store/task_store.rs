//! Task store and task state machine.
//!
//! # Responsibility
//! - Own tasks and apply validated full-replacement updates.
//! - Cascade task removal, completion and deadline moves to reminders.
//! - Sweep overdue tasks to `Delayed` once per session.
//!
//! # Invariants
//! - Task ids are unique within the store.
//! - Every stored task has a priority (Default when none was given).
//! - Completing a task leaves it without reminders.

use super::category_store::CategoryStore;
use super::priority_store::PriorityStore;
use super::reminder_store::ReminderStore;
use super::{log_rejected, EntityKind, StoreError, StoreResult};
use crate::model::category::CategoryId;
use crate::model::priority::PriorityId;
use crate::model::task::{Task, TaskId, TaskStatus, TaskUpdate};
use chrono::NaiveDate;
use log::info;

/// Case-insensitive substring filters for `TaskStore::search`.
///
/// `None` or an empty string matches every task; set filters are AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub title: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
}

/// Insertion-ordered task collection.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks in insertion order.
    pub fn all(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id() == id)
    }

    fn position(&self, id: TaskId) -> StoreResult<usize> {
        self.tasks
            .iter()
            .position(|task| task.id() == id)
            .ok_or(StoreError::not_found(EntityKind::Task, id))
    }

    /// Adds a task, assigning the Default priority when it has none.
    pub fn add(&mut self, task: Task, priorities: &PriorityStore) -> StoreResult<TaskId> {
        self.try_add(task, priorities)
            .inspect_err(|err| log_rejected("task_add", err))
    }

    fn try_add(&mut self, mut task: Task, priorities: &PriorityStore) -> StoreResult<TaskId> {
        if self.contains(task.id()) {
            return Err(StoreError::AlreadyExists {
                entity: EntityKind::Task,
                id: task.id(),
            });
        }
        if task.priority().is_none() {
            task.assign_priority(priorities.default_id());
        }

        let id = task.id();
        self.tasks.push(task);
        info!(
            "event=task_add module=store status=ok task_id={} total={}",
            id,
            self.tasks.len()
        );
        Ok(id)
    }

    /// Removes a task after removing every reminder it owns.
    pub fn remove(&mut self, id: TaskId, reminders: &mut ReminderStore) -> StoreResult<Task> {
        self.try_remove(id, reminders)
            .inspect_err(|err| log_rejected("task_remove", err))
    }

    fn try_remove(&mut self, id: TaskId, reminders: &mut ReminderStore) -> StoreResult<Task> {
        let position = self.position(id)?;
        let detached = reminders.detach_all(&mut self.tasks[position]);
        let task = self.tasks.remove(position);
        info!(
            "event=task_remove module=store status=ok task_id={} reminders_removed={}",
            id,
            detached.len()
        );
        Ok(task)
    }

    /// Replaces every editable field of a task.
    ///
    /// Validation happens before any mutation (see `Task::plan_update` for
    /// the deadline/status rules). After the update:
    /// - a task that became `Completed` loses all reminders;
    /// - a changed deadline re-evaluates the remaining reminders.
    ///
    /// Returns the stored status, which differs from the requested one when
    /// a delayed task moved to a future deadline is downgraded to `Open`.
    pub fn update(
        &mut self,
        id: TaskId,
        update: TaskUpdate,
        reminders: &mut ReminderStore,
        today: NaiveDate,
    ) -> StoreResult<TaskStatus> {
        self.try_update(id, update, reminders, today)
            .inspect_err(|err| log_rejected("task_update", err))
    }

    fn try_update(
        &mut self,
        id: TaskId,
        update: TaskUpdate,
        reminders: &mut ReminderStore,
        today: NaiveDate,
    ) -> StoreResult<TaskStatus> {
        let position = self.position(id)?;
        let plan = self.tasks[position].plan_update(&update, today)?;
        let status = plan.status;
        let completes = plan.completes;
        let deadline_changed = plan.deadline_changed;

        let task = &mut self.tasks[position];
        task.apply_update(&update, plan);

        let mut cleared = 0;
        if completes {
            cleared = reminders.detach_all(task).len();
        }
        let mut kept = task.reminders().len();
        if deadline_changed && !task.reminders().is_empty() {
            kept = reminders.reevaluate(task, today);
        }

        info!(
            "event=task_update module=store status=ok task_id={} task_status={} deadline_changed={} reminders_cleared={} reminders_kept={}",
            id, status, deadline_changed, cleared, kept
        );
        Ok(status)
    }

    /// Marks every overdue, non-completed task as `Delayed`.
    ///
    /// Returns how many tasks changed status.
    pub fn update_delayed_tasks(&mut self, today: NaiveDate) -> usize {
        let mut changed = 0;
        for task in &mut self.tasks {
            if task.is_overdue(today) && task.status() != TaskStatus::Delayed {
                task.set_status(TaskStatus::Delayed);
                changed += 1;
            }
        }
        info!(
            "event=task_sweep_delayed module=store status=ok changed={} today={}",
            changed, today
        );
        changed
    }

    /// Filters tasks by title, category name and priority name.
    pub fn search<'a>(
        &'a self,
        query: &TaskQuery,
        categories: &CategoryStore,
        priorities: &PriorityStore,
    ) -> Vec<&'a Task> {
        self.tasks
            .iter()
            .filter(|task| {
                let category_name = categories
                    .get(task.category())
                    .map(|category| category.name())
                    .unwrap_or_default();
                let priority_name = task
                    .priority()
                    .and_then(|id| priorities.get(id))
                    .map(|priority| priority.name())
                    .unwrap_or_default();

                contains_ignoring_case(query.title.as_deref(), task.title())
                    && contains_ignoring_case(query.category.as_deref(), category_name)
                    && contains_ignoring_case(query.priority.as_deref(), priority_name)
            })
            .collect()
    }

    pub(crate) fn ids_in_category(&self, category: CategoryId) -> Vec<TaskId> {
        self.tasks
            .iter()
            .filter(|task| task.category() == category)
            .map(Task::id)
            .collect()
    }

    pub(crate) fn reassign_priority(&mut self, from: PriorityId, to: PriorityId) -> usize {
        let mut reassigned = 0;
        for task in &mut self.tasks {
            if task.priority() == Some(from) {
                task.assign_priority(to);
                reassigned += 1;
            }
        }
        reassigned
    }
}

fn contains_ignoring_case(filter: Option<&str>, value: &str) -> bool {
    match filter {
        None | Some("") => true,
        Some(needle) => value.to_lowercase().contains(&needle.to_lowercase()),
    }
}
