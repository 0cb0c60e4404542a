//! Persistence layer: repository traits and their SQLite implementations.
//!
//! # Responsibility
//! - Keep all SQL, placeholder building and row parsing inside this layer.
//! - Expose the traits the service layer is generic over.
//!
//! # Invariants
//! - Listings are deterministic: every query carries an explicit ORDER BY.
//! - Multi-statement writes run inside one immediate transaction.

pub mod activity_repo;
pub mod building_repo;
pub mod organization_repo;

pub use activity_repo::{
    ActivityRepoError, ActivityRepoResult, ActivityRepository, SqliteActivityRepository,
};
pub use building_repo::{
    BuildingRepoError, BuildingRepoResult, BuildingRepository, SqliteBuildingRepository,
};
pub use organization_repo::{
    OrganizationRecord, OrganizationRepoError, OrganizationRepoResult, OrganizationRepository,
    SqliteOrganizationRepository,
};
