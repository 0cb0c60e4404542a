//! Activity domain model.
//!
//! # Responsibility
//! - Define the activity node of the classification tree.
//! - Validate activity names before they reach the store.
//!
//! # Invariants
//! - `parent_id == None` marks a root node (level 0).
//! - Names are unique tree-wide; the store enforces that, not this module.
//!
//! # See also
//! - `crate::service::activity_service` for the level cap.

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Store-assigned identifier of an activity node.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ActivityId = i64;

/// Upper bound on activity name length, counted in characters.
pub const ACTIVITY_NAME_MAX_CHARS: usize = 100;

/// One node of the activity classification tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Stable row id used for tagging organizations and parent links.
    pub id: ActivityId,
    /// Display name, unique across the whole tree.
    pub name: String,
    /// Immediate parent, `None` for root nodes.
    pub parent_id: Option<ActivityId>,
}

impl Activity {
    /// Returns whether this node is a tree root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityValidationError {
    BlankName,
    NameTooLong { length: usize },
}

impl Display for ActivityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "activity name must not be blank"),
            Self::NameTooLong { length } => write!(
                f,
                "activity name of {length} characters exceeds the {ACTIVITY_NAME_MAX_CHARS} character limit"
            ),
        }
    }
}

impl Error for ActivityValidationError {}

/// Trims and validates an activity name.
///
/// # Contract
/// - Blank (empty or whitespace-only) input fails with `BlankName`.
/// - Trimmed input longer than [`ACTIVITY_NAME_MAX_CHARS`] characters fails
///   with `NameTooLong`.
pub fn normalize_activity_name(raw: &str) -> Result<String, ActivityValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ActivityValidationError::BlankName);
    }

    let length = trimmed.chars().count();
    if length > ACTIVITY_NAME_MAX_CHARS {
        return Err(ActivityValidationError::NameTooLong { length });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_surrounding_whitespace() {
        let name = normalize_activity_name("  Еда  ").unwrap();
        assert_eq!(name, "Еда");
    }

    #[test]
    fn normalize_rejects_blank_input() {
        assert_eq!(
            normalize_activity_name("   "),
            Err(ActivityValidationError::BlankName)
        );
    }

    #[test]
    fn normalize_counts_characters_not_bytes() {
        // 100 Cyrillic characters are 200 bytes but still within the cap.
        let name = "д".repeat(ACTIVITY_NAME_MAX_CHARS);
        assert!(normalize_activity_name(&name).is_ok());

        let too_long = "д".repeat(ACTIVITY_NAME_MAX_CHARS + 1);
        assert_eq!(
            normalize_activity_name(&too_long),
            Err(ActivityValidationError::NameTooLong {
                length: ACTIVITY_NAME_MAX_CHARS + 1
            })
        );
    }

    #[test]
    fn activity_serializes_with_snake_case_fields() {
        let activity = Activity {
            id: 3,
            name: "Молочная продукция".to_string(),
            parent_id: Some(1),
        };
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["parent_id"], 1);
        assert_eq!(json["name"], "Молочная продукция");
    }
}
