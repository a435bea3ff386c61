//! Category store.
//!
//! # Invariants
//! - Category names are unique, case-insensitively.
//! - Removing a category first removes every task in it (and, through the
//!   task store, their reminders); no task is left pointing at a removed
//!   category.

use super::reminder_store::ReminderStore;
use super::task_store::TaskStore;
use super::{log_rejected, EntityKind, StoreError, StoreResult};
use crate::model::category::{Category, CategoryId};
use crate::model::{names_match, normalize_name};
use log::info;

/// Insertion-ordered category collection.
#[derive(Debug, Default)]
pub struct CategoryStore {
    categories: Vec<Category>,
}

impl CategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Categories in insertion order.
    pub fn all(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|category| category.id() == id)
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.get(id).is_some()
    }

    /// Exact (case-sensitive) name lookup, used when resolving snapshots.
    pub fn find_by_name(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|category| category.name() == name)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Adds a category.
    ///
    /// # Errors
    /// - `AlreadyExists` when the same category is already tracked.
    /// - `DuplicateName` when another category has the same name ignoring case.
    pub fn add(&mut self, category: Category) -> StoreResult<CategoryId> {
        self.try_add(category)
            .inspect_err(|err| log_rejected("category_add", err))
    }

    fn try_add(&mut self, category: Category) -> StoreResult<CategoryId> {
        if self.contains(category.id()) {
            return Err(StoreError::AlreadyExists {
                entity: EntityKind::Category,
                id: category.id(),
            });
        }
        self.ensure_name_free(category.name(), None)?;

        let id = category.id();
        self.categories.push(category);
        info!(
            "event=category_add module=store status=ok category_id={} total={}",
            id,
            self.categories.len()
        );
        Ok(id)
    }

    /// Removes a category and cascades to its tasks and their reminders.
    ///
    /// Returns the removed category.
    pub fn remove(
        &mut self,
        id: CategoryId,
        tasks: &mut TaskStore,
        reminders: &mut ReminderStore,
    ) -> StoreResult<Category> {
        self.try_remove(id, tasks, reminders)
            .inspect_err(|err| log_rejected("category_remove", err))
    }

    fn try_remove(
        &mut self,
        id: CategoryId,
        tasks: &mut TaskStore,
        reminders: &mut ReminderStore,
    ) -> StoreResult<Category> {
        let position = self
            .categories
            .iter()
            .position(|category| category.id() == id)
            .ok_or(StoreError::not_found(EntityKind::Category, id))?;

        let dependent = tasks.ids_in_category(id);
        for task_id in &dependent {
            tasks.remove(*task_id, reminders)?;
        }

        let removed = self.categories.remove(position);
        info!(
            "event=category_remove module=store status=ok category_id={} tasks_removed={}",
            id,
            dependent.len()
        );
        Ok(removed)
    }

    /// Renames a category in place; task references are unaffected.
    pub fn update(&mut self, id: CategoryId, new_name: impl Into<String>) -> StoreResult<()> {
        self.try_update(id, new_name.into())
            .inspect_err(|err| log_rejected("category_update", err))
    }

    fn try_update(&mut self, id: CategoryId, new_name: String) -> StoreResult<()> {
        let name = normalize_name("category", new_name)?;
        if !self.contains(id) {
            return Err(StoreError::not_found(EntityKind::Category, id));
        }
        self.ensure_name_free(&name, Some(id))?;

        if let Some(category) = self.categories.iter_mut().find(|category| category.id() == id) {
            category.rename(name);
        }
        info!(
            "event=category_update module=store status=ok category_id={}",
            id
        );
        Ok(())
    }

    fn ensure_name_free(&self, name: &str, except: Option<CategoryId>) -> StoreResult<()> {
        let taken = self
            .categories
            .iter()
            .filter(|category| Some(category.id()) != except)
            .any(|category| names_match(category.name(), name));
        if taken {
            return Err(StoreError::DuplicateName {
                entity: EntityKind::Category,
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
