//! Core domain logic for the organization directory.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod geo;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod seed;
pub mod service;

pub use db::{open_db, open_db_in_memory};
pub use geo::{radius_bounding_box, BoundingBox, GeoError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::activity::{Activity, ActivityId, ActivityValidationError};
pub use model::building::{Building, BuildingId, BuildingValidationError};
pub use model::organization::{Organization, OrganizationId, OrganizationValidationError};
pub use repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
pub use repo::building_repo::{BuildingRepository, SqliteBuildingRepository};
pub use repo::organization_repo::{
    OrganizationRecord, OrganizationRepository, SqliteOrganizationRepository,
};
pub use search::name::{search_organizations, NameQuery, OrganizationHit, SearchError};
pub use seed::{seed_demo_directory, SeedOutcome};
pub use service::activity_service::{ActivityService, ActivityServiceError, MAX_TREE_DEPTH};
pub use service::building_service::{BuildingService, BuildingServiceError};
pub use service::organization_service::{OrganizationService, OrganizationServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
