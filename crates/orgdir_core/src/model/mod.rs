//! Domain models shared by the repository and service layers.
//!
//! # Responsibility
//! - Define the canonical activity, building and organization records.
//! - Provide field-level validation helpers used before any write.
//!
//! # Invariants
//! - Models carry store-assigned integer ids; `id == 0` never leaves a repo.
//! - Validation helpers normalize (trim) before they judge.

pub mod activity;
pub mod building;
pub mod organization;

pub use activity::{
    normalize_activity_name, Activity, ActivityId, ActivityValidationError,
    ACTIVITY_NAME_MAX_CHARS,
};
pub use building::{
    normalize_address, validate_coordinates, Building, BuildingId, BuildingValidationError,
};
pub use organization::{
    is_valid_phone, normalize_organization_name, validate_phones, Organization, OrganizationId,
    OrganizationValidationError,
};
