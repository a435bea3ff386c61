//! Planner use-case service.
//!
//! # Responsibility
//! - Own the four stores, the clock and planner settings.
//! - Check cross-store references (category, priority) before delegating
//!   to the stores.
//! - Read `today` from the clock once per operation.
//!
//! # Invariants
//! - Every task references a tracked category and priority.
//! - A failed `load_snapshot` leaves the current state untouched.

use super::snapshot::{restore_state, snapshot_records, RestoreReport};
use super::summary::{summarize, TaskSummary};
use crate::clock::{Clock, SystemClock};
use crate::model::category::{Category, CategoryId};
use crate::model::priority::{Priority, PriorityId};
use crate::model::reminder::{Reminder, ReminderId, ReminderType};
use crate::model::task::{Task, TaskId, TaskStatus, TaskUpdate};
use crate::repo::snapshot_repo::{RepoError, RepoResult, SnapshotRepository};
use crate::store::category_store::CategoryStore;
use crate::store::priority_store::PriorityStore;
use crate::store::reminder_store::ReminderStore;
use crate::store::task_store::{TaskQuery, TaskStore};
use crate::store::{log_rejected, EntityKind, StoreError, StoreResult};
use chrono::NaiveDate;
use log::{error, info};
use std::time::Instant;

/// Default look-ahead of the dashboard "due soon" figure.
pub const DEFAULT_DUE_SOON_DAYS: u32 = 7;

/// Tunables for derived views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerSettings {
    pub due_soon_days: u32,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            due_soon_days: DEFAULT_DUE_SOON_DAYS,
        }
    }
}

/// Input for `PlannerService::create_task`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub category: CategoryId,
    /// `None` selects the Default priority.
    pub priority: Option<PriorityId>,
    pub deadline: NaiveDate,
}

/// The four stores, kept together so they can be swapped as one unit.
#[derive(Debug, Default)]
pub(crate) struct PlannerState {
    pub categories: CategoryStore,
    pub priorities: PriorityStore,
    pub tasks: TaskStore,
    pub reminders: ReminderStore,
}

/// Facade the presentation layer drives.
pub struct PlannerService<C: Clock = SystemClock> {
    state: PlannerState,
    clock: C,
    settings: PlannerSettings,
}

impl PlannerService<SystemClock> {
    /// Empty planner on the local calendar.
    pub fn new() -> Self {
        Self::with_clock(SystemClock, PlannerSettings::default())
    }
}

impl Default for PlannerService<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PlannerService<C> {
    /// Empty planner holding only the Default priority.
    pub fn with_clock(clock: C, settings: PlannerSettings) -> Self {
        Self {
            state: PlannerState::default(),
            clock,
            settings,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn settings(&self) -> PlannerSettings {
        self.settings
    }

    pub fn categories(&self) -> &CategoryStore {
        &self.state.categories
    }

    pub fn priorities(&self) -> &PriorityStore {
        &self.state.priorities
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.state.tasks
    }

    pub fn reminders(&self) -> &ReminderStore {
        &self.state.reminders
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.state.tasks.get(id)
    }

    pub fn add_category(&mut self, name: &str) -> StoreResult<CategoryId> {
        let category = Category::new(name)
            .map_err(StoreError::from)
            .inspect_err(|err| log_rejected("category_add", err))?;
        self.state.categories.add(category)
    }

    pub fn rename_category(&mut self, id: CategoryId, new_name: &str) -> StoreResult<()> {
        self.state.categories.update(id, new_name)
    }

    /// Removes a category together with its tasks and their reminders.
    pub fn remove_category(&mut self, id: CategoryId) -> StoreResult<Category> {
        let state = &mut self.state;
        state
            .categories
            .remove(id, &mut state.tasks, &mut state.reminders)
    }

    pub fn add_priority(&mut self, name: &str) -> StoreResult<PriorityId> {
        let priority = Priority::new(name)
            .map_err(StoreError::from)
            .inspect_err(|err| log_rejected("priority_add", err))?;
        self.state.priorities.add(priority)
    }

    pub fn rename_priority(&mut self, id: PriorityId, new_name: &str) -> StoreResult<()> {
        self.state.priorities.update(id, new_name)
    }

    /// Removes a priority; its tasks move to Default.
    pub fn remove_priority(&mut self, id: PriorityId) -> StoreResult<Priority> {
        let state = &mut self.state;
        state.priorities.remove(id, &mut state.tasks)
    }

    /// Creates an `Open` task.
    ///
    /// # Errors
    /// - `NotFound` for an untracked category or priority.
    /// - Blank text or a deadline before today.
    pub fn create_task(&mut self, input: NewTask) -> StoreResult<TaskId> {
        let today = self.today();
        let state = &mut self.state;
        let task = ensure_references(state, input.category, input.priority)
            .and_then(|()| {
                Task::new(
                    input.title,
                    input.description,
                    input.category,
                    input.priority,
                    input.deadline,
                    today,
                )
                .map_err(StoreError::from)
            })
            .inspect_err(|err| log_rejected("task_add", err))?;
        state.tasks.add(task, &state.priorities)
    }

    /// Replaces a task's fields; returns the stored status.
    pub fn update_task(&mut self, id: TaskId, update: TaskUpdate) -> StoreResult<TaskStatus> {
        let today = self.today();
        let state = &mut self.state;
        ensure_references(state, update.category, Some(update.priority))
            .inspect_err(|err| log_rejected("task_update", err))?;
        state.tasks.update(id, update, &mut state.reminders, today)
    }

    pub fn remove_task(&mut self, id: TaskId) -> StoreResult<Task> {
        let state = &mut self.state;
        state.tasks.remove(id, &mut state.reminders)
    }

    /// Attaches a new reminder to a task.
    ///
    /// `custom_date` is required for `CustomDate` and ignored otherwise.
    pub fn add_reminder(
        &mut self,
        task_id: TaskId,
        kind: ReminderType,
        custom_date: Option<NaiveDate>,
    ) -> StoreResult<ReminderId> {
        let today = self.today();
        let state = &mut self.state;
        let reminder = state
            .tasks
            .get(task_id)
            .ok_or(StoreError::NotFound {
                entity: EntityKind::Task,
                id: task_id,
            })
            .and_then(|task| {
                Reminder::new(kind, task, custom_date, today).map_err(StoreError::from)
            })
            .inspect_err(|err| log_rejected("reminder_add", err))?;
        state.reminders.add(&mut state.tasks, reminder, today)
    }

    /// See `ReminderStore::update`; returns the id the reminder ends up with.
    pub fn update_reminder(
        &mut self,
        id: ReminderId,
        kind: ReminderType,
        custom_date: Option<NaiveDate>,
    ) -> StoreResult<ReminderId> {
        let today = self.today();
        let state = &mut self.state;
        state
            .reminders
            .update(&mut state.tasks, id, kind, custom_date, today)
    }

    pub fn remove_reminder(&mut self, id: ReminderId) -> StoreResult<Reminder> {
        let state = &mut self.state;
        state.reminders.remove(&mut state.tasks, id)
    }

    /// Re-derives a task's reminders against its current deadline.
    pub fn reevaluate_reminders(&mut self, task_id: TaskId) -> StoreResult<usize> {
        let today = self.today();
        let state = &mut self.state;
        state
            .reminders
            .reevaluate_reminders_for_task(&mut state.tasks, task_id, today)
    }

    pub fn search_tasks(&self, query: &TaskQuery) -> Vec<&Task> {
        self.state
            .tasks
            .search(query, &self.state.categories, &self.state.priorities)
    }

    /// Marks overdue, non-completed tasks `Delayed`; returns how many changed.
    pub fn mark_delayed_tasks(&mut self) -> usize {
        let today = self.today();
        self.state.tasks.update_delayed_tasks(today)
    }

    pub fn summary(&self) -> TaskSummary {
        summarize(
            self.state.tasks.all(),
            self.today(),
            self.settings.due_soon_days,
        )
    }

    /// Replaces the current state with the snapshot held by `repo`.
    ///
    /// Ends with the delayed-task sweep.
    pub fn load_snapshot(
        &mut self,
        repo: &(impl SnapshotRepository + ?Sized),
    ) -> RepoResult<RestoreReport> {
        let started_at = Instant::now();
        let (state, report) = restore_state(repo, self.today())
            .inspect_err(|err| log_snapshot_error("snapshot_load", started_at, err))?;
        self.state = state;
        info!(
            "event=snapshot_load module=service status=ok duration_ms={} categories={} priorities={} tasks={} reminders={} skipped_tasks={} skipped_reminders={} discarded_reminders={} delayed={}",
            started_at.elapsed().as_millis(),
            report.categories,
            report.priorities,
            report.tasks,
            report.reminders,
            report.skipped_tasks,
            report.skipped_reminders,
            report.discarded_reminders,
            report.delayed
        );
        Ok(report)
    }

    /// Writes categories, priorities and tasks (with reminders) to `repo` as
    /// one unit; a failed save leaves the previous snapshot loadable.
    pub fn save_snapshot(&self, repo: &(impl SnapshotRepository + ?Sized)) -> RepoResult<()> {
        let started_at = Instant::now();
        let (categories, priorities, tasks) = snapshot_records(&self.state);
        repo.save_snapshot(&categories, &priorities, &tasks)
            .inspect_err(|err| log_snapshot_error("snapshot_save", started_at, err))?;
        info!(
            "event=snapshot_save module=service status=ok duration_ms={} categories={} priorities={} tasks={}",
            started_at.elapsed().as_millis(),
            categories.len(),
            priorities.len(),
            tasks.len()
        );
        Ok(())
    }
}

fn ensure_references(
    state: &PlannerState,
    category: CategoryId,
    priority: Option<PriorityId>,
) -> StoreResult<()> {
    if !state.categories.contains(category) {
        return Err(StoreError::NotFound {
            entity: EntityKind::Category,
            id: category,
        });
    }
    if let Some(priority) = priority.filter(|id| !state.priorities.contains(*id)) {
        return Err(StoreError::NotFound {
            entity: EntityKind::Priority,
            id: priority,
        });
    }
    Ok(())
}

fn log_snapshot_error(event: &str, started_at: Instant, err: &RepoError) {
    error!(
        "event={} module=service status=error duration_ms={} error_code={} error={}",
        event,
        started_at.elapsed().as_millis(),
        err.code(),
        err
    );
}
