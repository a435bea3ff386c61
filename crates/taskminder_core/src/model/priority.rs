//! Priority domain model.
//!
//! # Invariants
//! - Exactly one Priority carries `is_default = true`; it is built by
//!   `PriorityStore::new` and never renamed or removed.
//! - User-created priorities are never default, whatever their name.

use super::{normalize_name, BlankNameError};
use uuid::Uuid;

/// Stable priority identifier.
pub type PriorityId = Uuid;

/// Name of the built-in priority assigned to tasks without one.
pub const DEFAULT_PRIORITY_NAME: &str = "Default";

/// Named task priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Priority {
    id: PriorityId,
    name: String,
    is_default: bool,
}

impl Priority {
    /// Creates a user priority with a generated id.
    pub fn new(name: impl Into<String>) -> Result<Self, BlankNameError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: normalize_name("priority", name)?,
            is_default: false,
        })
    }

    /// Builds the protected built-in priority.
    pub(crate) fn builtin_default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: DEFAULT_PRIORITY_NAME.to_string(),
            is_default: true,
        }
    }

    pub fn id(&self) -> PriorityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether this is the protected built-in priority.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, DEFAULT_PRIORITY_NAME};

    #[test]
    fn user_priority_named_default_is_not_the_builtin() {
        let priority = Priority::new("default").unwrap();
        assert!(!priority.is_default());
    }

    #[test]
    fn builtin_default_uses_reserved_name() {
        let priority = Priority::builtin_default();
        assert!(priority.is_default());
        assert_eq!(priority.name(), DEFAULT_PRIORITY_NAME);
    }
}
