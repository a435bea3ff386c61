//! Category domain model.
//!
//! # Invariants
//! - `name` is non-blank; uniqueness is enforced by `CategoryStore`.
//! - Renaming keeps the id, so task references stay valid.

use super::{normalize_name, BlankNameError};
use uuid::Uuid;

/// Stable category identifier.
pub type CategoryId = Uuid;

/// Named task grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    id: CategoryId,
    name: String,
}

impl Category {
    /// Creates a category with a generated id.
    pub fn new(name: impl Into<String>) -> Result<Self, BlankNameError> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: normalize_name("category", name)?,
        })
    }

    pub fn id(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }
}
