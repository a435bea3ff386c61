//! Domain model for categories, priorities, tasks and reminders.
//!
//! # Responsibility
//! - Define the entity types owned by the in-memory stores.
//! - Provide pure validate-then-build helpers; entities are never left
//!   partially mutated by a failed validation.
//!
//! # Invariants
//! - Every entity is identified by a generated, immutable UUID.
//! - Category and Priority names are non-blank and compared case-insensitively.
//! - A Task exclusively owns its Reminders; a Reminder only carries the id of
//!   its owning Task.

pub mod category;
pub mod priority;
pub mod reminder;
pub mod task;

use thiserror::Error;

/// Name input is blank after trim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{entity} name must not be blank")]
pub struct BlankNameError {
    /// Entity label used in the message (`category`, `priority`).
    pub entity: &'static str,
}

/// Trims a user-supplied name and rejects blank input.
pub(crate) fn normalize_name(
    entity: &'static str,
    value: impl Into<String>,
) -> Result<String, BlankNameError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BlankNameError { entity });
    }
    Ok(trimmed.to_string())
}

/// Case-insensitive name comparison used by every uniqueness rule.
pub(crate) fn names_match(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}
