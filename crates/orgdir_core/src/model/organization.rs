//! Organization domain model.
//!
//! # Responsibility
//! - Define the organization record and its contact data.
//! - Validate names and phone numbers before any write.
//!
//! # Invariants
//! - `phones` preserves caller order; the store keeps it stable.
//! - `building_id == None` means the organization has no premises and is
//!   invisible to geo queries.

use std::error::Error;
use std::fmt::{Display, Formatter};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::building::BuildingId;

/// Store-assigned identifier of an organization.
pub type OrganizationId = i64;

/// Accepted phone shapes: `+7XXXXXXXXXX`, `X-XXX-XXX` and `X-XXX-XXX-XX-XX`
/// where the leading digit is 2, 3 or 8 and separators may be `-`, `.` or
/// whitespace.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:\+7\d{10}|[238](?:[-.\s]\d{3}){2}|[238](?:[-.\s]\d{3}){2}(?:[-.\s]\d{2}){2})$",
    )
    .expect("valid phone number regex")
});

/// An organization listed in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Stable row id.
    pub id: OrganizationId,
    /// Display name. Not unique; several branches may share one name.
    pub name: String,
    /// Contact numbers in caller-supplied order.
    pub phones: Vec<String>,
    /// Housing building, when the organization has premises.
    pub building_id: Option<BuildingId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationValidationError {
    BlankName,
    InvalidPhone(String),
}

impl Display for OrganizationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "organization name must not be blank"),
            Self::InvalidPhone(number) => write!(f, "phone number {number:?} is not valid"),
        }
    }
}

impl Error for OrganizationValidationError {}

/// Trims and validates an organization name.
pub fn normalize_organization_name(raw: &str) -> Result<String, OrganizationValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(OrganizationValidationError::BlankName);
    }
    Ok(trimmed.to_string())
}

/// Returns whether one phone number matches the accepted shapes.
pub fn is_valid_phone(raw: &str) -> bool {
    PHONE_RE.is_match(raw)
}

/// Validates every phone in a list, failing on the first bad entry.
pub fn validate_phones(phones: &[String]) -> Result<(), OrganizationValidationError> {
    for phone in phones {
        if !is_valid_phone(phone) {
            return Err(OrganizationValidationError::InvalidPhone(phone.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mobile_and_short_city_formats() {
        assert!(is_valid_phone("+79991234567"));
        assert!(is_valid_phone("2-222-222"));
        assert!(is_valid_phone("3.333.333"));
        assert!(is_valid_phone("8-999-123-45-67"));
        assert!(is_valid_phone("8 999 123 45 67"));
    }

    #[test]
    fn rejects_malformed_numbers() {
        // Too few digits after the +7 prefix.
        assert!(!is_valid_phone("+7999123456"));
        // Leading digit outside the accepted set.
        assert!(!is_valid_phone("9-999-999"));
        assert!(!is_valid_phone("89991234567"));
        assert!(!is_valid_phone(""));
        // Trailing garbage is not allowed by the anchors.
        assert!(!is_valid_phone("+79991234567x"));
    }

    #[test]
    fn validate_phones_reports_the_offending_entry() {
        let phones = vec!["+79991234567".to_string(), "bogus".to_string()];
        assert_eq!(
            validate_phones(&phones),
            Err(OrganizationValidationError::InvalidPhone("bogus".to_string()))
        );
        assert!(validate_phones(&phones[..1]).is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            normalize_organization_name("  "),
            Err(OrganizationValidationError::BlankName)
        );
    }
}
