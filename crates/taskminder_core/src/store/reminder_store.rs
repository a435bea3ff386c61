//! Reminder store.
//!
//! # Responsibility
//! - Track reminders as an ordered index over task-owned reminder lists.
//! - Add, retype, redate and remove reminders, keeping the owning task's
//!   list in step with the index.
//! - Rebuild a task's reminders after its deadline moves.
//!
//! # Invariants
//! - An index entry exists iff the owning task holds the reminder; the only
//!   tolerated drift is repaired (and reported) on the next add/remove.
//! - Repair never re-attaches a reminder that fails validation against the
//!   task's current state; the stale entry is dropped instead.
//! - Re-evaluation drops, without error, every reminder that no longer fits
//!   the new deadline.

use super::task_store::TaskStore;
use super::{log_rejected, EntityKind, StoreError, StoreResult};
use crate::model::reminder::{
    resolve_date, validate_proposed, Reminder, ReminderId, ReminderType, ReminderValidationError,
};
use crate::model::task::{Task, TaskId};
use chrono::NaiveDate;
use log::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexEntry {
    reminder_id: ReminderId,
    task_id: TaskId,
}

/// Ordered index of every tracked reminder and its owning task.
#[derive(Debug, Default)]
pub struct ReminderStore {
    entries: Vec<IndexEntry>,
}

impl ReminderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: ReminderId) -> bool {
        self.task_of(id).is_some()
    }

    /// Owning task of a tracked reminder.
    pub fn task_of(&self, id: ReminderId) -> Option<TaskId> {
        self.entries
            .iter()
            .find(|entry| entry.reminder_id == id)
            .map(|entry| entry.task_id)
    }

    /// Tracked reminders in tracking order.
    pub fn all<'a>(&self, tasks: &'a TaskStore) -> Vec<&'a Reminder> {
        self.entries
            .iter()
            .filter_map(|entry| {
                tasks
                    .get(entry.task_id)
                    .and_then(|task| task.reminder(entry.reminder_id))
            })
            .collect()
    }

    /// Tracks a reminder and attaches it to its owning task.
    ///
    /// # Errors
    /// - `NotFound` when the owning task is not in `tasks`.
    /// - Any reminder invariant violation against the task's current state.
    /// - `AlreadyExists` when the reminder is already tracked and attached.
    /// - `ReminderIndexRepaired` when the reminder was tracked but missing
    ///   from its task; the task list is repaired before returning.
    /// - The validation error when such a reminder no longer fits the task;
    ///   the stale index entry is dropped before returning.
    pub fn add(
        &mut self,
        tasks: &mut TaskStore,
        reminder: Reminder,
        today: NaiveDate,
    ) -> StoreResult<ReminderId> {
        self.try_add(tasks, reminder, today)
            .inspect_err(|err| log_rejected("reminder_add", err))
    }

    fn try_add(
        &mut self,
        tasks: &mut TaskStore,
        reminder: Reminder,
        today: NaiveDate,
    ) -> StoreResult<ReminderId> {
        let task = tasks
            .get_mut(reminder.task_id())
            .ok_or(StoreError::not_found(EntityKind::Task, reminder.task_id()))?;
        self.attach(task, reminder, today)
    }

    pub(crate) fn attach(
        &mut self,
        task: &mut Task,
        reminder: Reminder,
        today: NaiveDate,
    ) -> StoreResult<ReminderId> {
        let id = reminder.id();
        if reminder.task_id() != task.id() {
            return Err(StoreError::ReminderOwnerMismatch {
                reminder_id: id,
                owner: reminder.task_id(),
                task_id: task.id(),
            });
        }

        if !self.contains(id) {
            validate_proposed(task, Some(id), reminder.kind(), reminder.date(), today)?;
            task.attach_reminder(reminder);
            self.entries.push(IndexEntry {
                reminder_id: id,
                task_id: task.id(),
            });
            info!(
                "event=reminder_add module=store status=ok reminder_id={} task_id={}",
                id,
                task.id()
            );
            return Ok(id);
        }

        if task.reminder(id).is_none() {
            if let Err(err) =
                validate_proposed(task, Some(id), reminder.kind(), reminder.date(), today)
            {
                let err = StoreError::from(err);
                self.entries.retain(|entry| entry.reminder_id != id);
                warn!(
                    "event=reminder_index_repair module=store status=dropped reminder_id={} task_id={} error_code={}",
                    id,
                    task.id(),
                    err.code()
                );
                return Err(err);
            }
            warn!(
                "event=reminder_index_repair module=store status=repaired reminder_id={} task_id={}",
                id,
                task.id()
            );
            task.attach_reminder(reminder);
            return Err(StoreError::ReminderIndexRepaired {
                reminder_id: id,
                task_id: task.id(),
            });
        }

        Err(StoreError::AlreadyExists {
            entity: EntityKind::Reminder,
            id,
        })
    }

    /// Changes a reminder's type and, for `CustomDate`, its date.
    ///
    /// - Custom to custom: the date changes in place.
    /// - Relative to custom: the reminder is replaced by a new one; the new
    ///   id is returned.
    /// - Any type to relative: the date is re-derived from the deadline.
    ///
    /// A failed validation leaves the reminder untouched.
    pub fn update(
        &mut self,
        tasks: &mut TaskStore,
        id: ReminderId,
        new_type: ReminderType,
        new_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> StoreResult<ReminderId> {
        self.try_update(tasks, id, new_type, new_date, today)
            .inspect_err(|err| log_rejected("reminder_update", err))
    }

    fn try_update(
        &mut self,
        tasks: &mut TaskStore,
        id: ReminderId,
        new_type: ReminderType,
        new_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> StoreResult<ReminderId> {
        let task_id = self
            .task_of(id)
            .ok_or(StoreError::not_found(EntityKind::Reminder, id))?;
        let task = tasks
            .get_mut(task_id)
            .ok_or(StoreError::not_found(EntityKind::Task, task_id))?;
        let current_type = task
            .reminder(id)
            .map(Reminder::kind)
            .ok_or(StoreError::not_found(EntityKind::Reminder, id))?;

        if new_type == ReminderType::CustomDate {
            let date = new_date.ok_or(ReminderValidationError::CustomDateRequired)?;
            if current_type != ReminderType::CustomDate {
                let replacement = Reminder::build(
                    Uuid::new_v4(),
                    ReminderType::CustomDate,
                    task,
                    Some(date),
                    today,
                    Some(id),
                )?;
                self.detach(task, id)?;
                let new_id = self.attach(task, replacement, today)?;
                info!(
                    "event=reminder_update module=store status=ok reminder_id={} replaced_by={}",
                    id, new_id
                );
                return Ok(new_id);
            }
            validate_proposed(task, Some(id), new_type, date, today)?;
            self.apply_in_place(task, id, new_type, date);
            return Ok(id);
        }

        let date = resolve_date(new_type, task.deadline(), None)?;
        validate_proposed(task, Some(id), new_type, date, today)?;
        self.apply_in_place(task, id, new_type, date);
        Ok(id)
    }

    fn apply_in_place(&self, task: &mut Task, id: ReminderId, kind: ReminderType, date: NaiveDate) {
        if let Some(reminder) = task.reminder_mut(id) {
            reminder.apply(kind, date);
        }
        info!(
            "event=reminder_update module=store status=ok reminder_id={} reminder_type={}",
            id, kind
        );
    }

    /// Untracks a reminder and detaches it from its task.
    pub fn remove(&mut self, tasks: &mut TaskStore, id: ReminderId) -> StoreResult<Reminder> {
        self.try_remove(tasks, id)
            .inspect_err(|err| log_rejected("reminder_remove", err))
    }

    fn try_remove(&mut self, tasks: &mut TaskStore, id: ReminderId) -> StoreResult<Reminder> {
        let task_id = self
            .task_of(id)
            .ok_or(StoreError::not_found(EntityKind::Reminder, id))?;
        let task = tasks
            .get_mut(task_id)
            .ok_or(StoreError::not_found(EntityKind::Task, task_id))?;
        let removed = self.detach(task, id)?;
        info!(
            "event=reminder_remove module=store status=ok reminder_id={} task_id={}",
            id, task_id
        );
        Ok(removed)
    }

    /// Drops the index entry, then detaches from the task. An entry whose
    /// reminder is already gone from the task is still dropped, and the
    /// call reports `NotFound`.
    pub(crate) fn detach(&mut self, task: &mut Task, id: ReminderId) -> StoreResult<Reminder> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.reminder_id == id && entry.task_id == task.id())
            .ok_or(StoreError::not_found(EntityKind::Reminder, id))?;
        self.entries.remove(position);

        task.detach_reminder(id).ok_or_else(|| {
            warn!(
                "event=reminder_index_repair module=store status=repaired reminder_id={} task_id={}",
                id,
                task.id()
            );
            StoreError::not_found(EntityKind::Reminder, id)
        })
    }

    /// Untracks and detaches every reminder of `task`.
    pub(crate) fn detach_all(&mut self, task: &mut Task) -> Vec<Reminder> {
        let task_id = task.id();
        self.entries.retain(|entry| entry.task_id != task_id);
        task.take_reminders()
    }

    /// Rebuilds a task's reminders after its deadline changed.
    ///
    /// Returns how many reminders the task keeps.
    pub fn reevaluate_reminders_for_task(
        &mut self,
        tasks: &mut TaskStore,
        task_id: TaskId,
        today: NaiveDate,
    ) -> StoreResult<usize> {
        let task = tasks
            .get_mut(task_id)
            .ok_or(StoreError::not_found(EntityKind::Task, task_id))
            .inspect_err(|err| log_rejected("reminder_reevaluate", err))?;
        Ok(self.reevaluate(task, today))
    }

    /// Relative reminders are re-derived under the current deadline and kept
    /// only when the new date is not in the past; custom reminders keep their
    /// date and survive only if it still passes validation. Relative
    /// replacements are added first, then custom ones. Ids are preserved.
    pub(crate) fn reevaluate(&mut self, task: &mut Task, today: NaiveDate) -> usize {
        let task_id = task.id();
        let previous = self.detach_all(task);
        let total = previous.len();

        let (relative, custom): (Vec<Reminder>, Vec<Reminder>) = previous
            .into_iter()
            .filter(|reminder| reminder.task_id() == task_id)
            .partition(|reminder| reminder.kind().is_relative());

        let queued_relative: Vec<Reminder> = relative
            .into_iter()
            .filter(|reminder| {
                reminder
                    .kind()
                    .date_for_deadline(task.deadline())
                    .is_some_and(|date| date >= today)
            })
            .collect();

        for reminder in queued_relative {
            self.rebuild(task, &reminder, None, today);
        }
        for reminder in custom {
            self.rebuild(task, &reminder, Some(reminder.date()), today);
        }

        let kept = task.reminders().len();
        info!(
            "event=reminder_reevaluate module=store status=ok task_id={} kept={} dropped={}",
            task_id,
            kept,
            total - kept
        );
        kept
    }

    fn rebuild(
        &mut self,
        task: &mut Task,
        previous: &Reminder,
        custom_date: Option<NaiveDate>,
        today: NaiveDate,
    ) {
        let rebuilt = Reminder::build(
            previous.id(),
            previous.kind(),
            task,
            custom_date,
            today,
            Some(previous.id()),
        )
        .map_err(StoreError::from)
        .and_then(|reminder| self.attach(task, reminder, today));

        if let Err(err) = rebuilt {
            debug!(
                "event=reminder_reevaluate module=store status=skip reminder_id={} error_code={}",
                previous.id(),
                err.code()
            );
        }
    }
}
