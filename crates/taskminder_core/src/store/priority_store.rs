//! Priority store.
//!
//! # Invariants
//! - Exactly one Default priority exists from construction onward; it cannot
//!   be renamed or removed.
//! - Priority names are unique, case-insensitively.
//! - Removing a priority never removes tasks: they move to Default.

use super::task_store::TaskStore;
use super::{log_rejected, EntityKind, StoreError, StoreResult};
use crate::model::priority::{Priority, PriorityId};
use crate::model::{names_match, normalize_name};
use log::info;

/// Insertion-ordered priority collection seeded with the Default priority.
#[derive(Debug)]
pub struct PriorityStore {
    priorities: Vec<Priority>,
    default_id: PriorityId,
}

impl Default for PriorityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityStore {
    /// Creates a store holding only the built-in Default priority.
    pub fn new() -> Self {
        let default_priority = Priority::builtin_default();
        Self {
            default_id: default_priority.id(),
            priorities: vec![default_priority],
        }
    }

    /// Priorities in insertion order; Default is first.
    pub fn all(&self) -> &[Priority] {
        &self.priorities
    }

    pub fn get(&self, id: PriorityId) -> Option<&Priority> {
        self.priorities.iter().find(|priority| priority.id() == id)
    }

    pub fn contains(&self, id: PriorityId) -> bool {
        self.get(id).is_some()
    }

    /// Exact (case-sensitive) name lookup, used when resolving snapshots.
    pub fn find_by_name(&self, name: &str) -> Option<&Priority> {
        self.priorities
            .iter()
            .find(|priority| priority.name() == name)
    }

    pub fn default_id(&self) -> PriorityId {
        self.default_id
    }

    /// The built-in Default priority; `None` only if the store was corrupted.
    pub fn default_priority(&self) -> Option<&Priority> {
        self.get(self.default_id)
    }

    pub fn len(&self) -> usize {
        self.priorities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priorities.is_empty()
    }

    /// Adds a user priority.
    ///
    /// # Errors
    /// - `AlreadyExists` when the same priority is already tracked.
    /// - `DuplicateName` on a case-insensitive name clash (including Default).
    pub fn add(&mut self, priority: Priority) -> StoreResult<PriorityId> {
        self.try_add(priority)
            .inspect_err(|err| log_rejected("priority_add", err))
    }

    fn try_add(&mut self, priority: Priority) -> StoreResult<PriorityId> {
        if self.contains(priority.id()) {
            return Err(StoreError::AlreadyExists {
                entity: EntityKind::Priority,
                id: priority.id(),
            });
        }
        self.ensure_name_free(priority.name(), None)?;

        let id = priority.id();
        self.priorities.push(priority);
        info!(
            "event=priority_add module=store status=ok priority_id={} total={}",
            id,
            self.priorities.len()
        );
        Ok(id)
    }

    /// Removes a priority, moving its tasks to Default.
    pub fn remove(&mut self, id: PriorityId, tasks: &mut TaskStore) -> StoreResult<Priority> {
        self.try_remove(id, tasks)
            .inspect_err(|err| log_rejected("priority_remove", err))
    }

    fn try_remove(&mut self, id: PriorityId, tasks: &mut TaskStore) -> StoreResult<Priority> {
        if id == self.default_id {
            return Err(StoreError::ProtectedPriority { action: "removed" });
        }
        let position = self
            .priorities
            .iter()
            .position(|priority| priority.id() == id)
            .ok_or(StoreError::not_found(EntityKind::Priority, id))?;

        let reassigned = tasks.reassign_priority(id, self.default_id);
        let removed = self.priorities.remove(position);
        info!(
            "event=priority_remove module=store status=ok priority_id={} tasks_reassigned={}",
            id, reassigned
        );
        Ok(removed)
    }

    /// Renames a user priority.
    ///
    /// The uniqueness check skips the priority being renamed, so a case-only
    /// rename (`high` -> `High`) is accepted.
    pub fn update(&mut self, id: PriorityId, new_name: impl Into<String>) -> StoreResult<()> {
        self.try_update(id, new_name.into())
            .inspect_err(|err| log_rejected("priority_update", err))
    }

    fn try_update(&mut self, id: PriorityId, new_name: String) -> StoreResult<()> {
        if id == self.default_id {
            return Err(StoreError::ProtectedPriority { action: "renamed" });
        }
        let name = normalize_name("priority", new_name)?;
        if !self.contains(id) {
            return Err(StoreError::not_found(EntityKind::Priority, id));
        }
        self.ensure_name_free(&name, Some(id))?;

        if let Some(priority) = self.priorities.iter_mut().find(|priority| priority.id() == id) {
            priority.rename(name);
        }
        info!(
            "event=priority_update module=store status=ok priority_id={}",
            id
        );
        Ok(())
    }

    fn ensure_name_free(&self, name: &str, except: Option<PriorityId>) -> StoreResult<()> {
        let taken = self
            .priorities
            .iter()
            .filter(|priority| Some(priority.id()) != except)
            .any(|priority| names_match(priority.name(), name));
        if taken {
            return Err(StoreError::DuplicateName {
                entity: EntityKind::Priority,
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
