//! Demo dataset seeding.
//!
//! # Responsibility
//! - Populate an empty database with a small directory sample for local
//!   runs and smoke tests.
//!
//! # Invariants
//! - Seeding is idempotent: a second call detects the sample organization
//!   by name and leaves the store untouched.
//! - All rows go through the service layer, so the sample obeys the same
//!   validation rules as regular writes.

use crate::repo::activity_repo::{ActivityRepoError, SqliteActivityRepository};
use crate::repo::building_repo::SqliteBuildingRepository;
use crate::repo::organization_repo::SqliteOrganizationRepository;
use crate::search::name::{search_organizations, NameQuery, SearchError};
use crate::service::activity_service::{ActivityService, ActivityServiceError};
use crate::service::building_service::{BuildingService, BuildingServiceError};
use crate::service::organization_service::{OrganizationService, OrganizationServiceError};
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Name of the sample organization used as the idempotence marker.
const SAMPLE_ORGANIZATION_NAME: &str = "ООО Рога и Копыта";

/// What a seeding call did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The sample dataset was written.
    Inserted,
    /// The sample dataset was already there; nothing was written.
    AlreadyPresent,
}

/// Errors from seeding the demo dataset.
#[derive(Debug)]
pub enum SeedError {
    /// The idempotence probe failed.
    Search(SearchError),
    /// The activity store was not usable or an activity write failed.
    ActivityRepo(ActivityRepoError),
    /// An activity write failed validation.
    Activity(ActivityServiceError),
    /// A building write failed.
    Building(BuildingServiceError),
    /// The organization write failed.
    Organization(OrganizationServiceError),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Search(err) => write!(f, "{err}"),
            Self::ActivityRepo(err) => write!(f, "{err}"),
            Self::Activity(err) => write!(f, "{err}"),
            Self::Building(err) => write!(f, "{err}"),
            Self::Organization(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Search(err) => Some(err),
            Self::ActivityRepo(err) => Some(err),
            Self::Activity(err) => Some(err),
            Self::Building(err) => Some(err),
            Self::Organization(err) => Some(err),
        }
    }
}

impl From<SearchError> for SeedError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

impl From<ActivityRepoError> for SeedError {
    fn from(value: ActivityRepoError) -> Self {
        Self::ActivityRepo(value)
    }
}

impl From<ActivityServiceError> for SeedError {
    fn from(value: ActivityServiceError) -> Self {
        Self::Activity(value)
    }
}

impl From<BuildingServiceError> for SeedError {
    fn from(value: BuildingServiceError) -> Self {
        Self::Building(value)
    }
}

impl From<OrganizationServiceError> for SeedError {
    fn from(value: OrganizationServiceError) -> Self {
        Self::Organization(value)
    }
}

/// Seeds the demo directory: two buildings, two activity trees and one
/// organization tagged into the food subtree.
///
/// # Side effects
/// - Writes rows unless the sample organization already exists.
/// - Emits `seed` logging events with duration and status.
pub fn seed_demo_directory(conn: &Connection) -> Result<SeedOutcome, SeedError> {
    let started_at = Instant::now();
    info!("event=seed module=seed status=start");

    match seed_demo_directory_inner(conn) {
        Ok(outcome) => {
            info!(
                "event=seed module=seed status=ok outcome={} duration_ms={}",
                match outcome {
                    SeedOutcome::Inserted => "inserted",
                    SeedOutcome::AlreadyPresent => "already_present",
                },
                started_at.elapsed().as_millis()
            );
            Ok(outcome)
        }
        Err(err) => {
            error!(
                "event=seed module=seed status=error duration_ms={} error_code=seed_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn seed_demo_directory_inner(conn: &Connection) -> Result<SeedOutcome, SeedError> {
    let probe = NameQuery::new(SAMPLE_ORGANIZATION_NAME);
    if !search_organizations(conn, &probe)?.is_empty() {
        return Ok(SeedOutcome::AlreadyPresent);
    }

    let buildings = BuildingService::new(SqliteBuildingRepository::new(conn));
    let activities = ActivityService::new(SqliteActivityRepository::try_new(conn)?);
    let organizations = OrganizationService::new(
        SqliteOrganizationRepository::new(conn),
        ActivityService::new(SqliteActivityRepository::try_new(conn)?),
        SqliteBuildingRepository::new(conn),
    );

    let headquarters = buildings.create_building("ул. Ленина, 1", 55.7558, 37.6173)?;
    buildings.create_building("ул. Мира, 10", 55.7580, 37.6200)?;

    let food = activities.create_activity("Еда", None)?;
    let cars = activities.create_activity("Автомобили", None)?;
    let meat = activities.create_activity("Мясная продукция", Some(food.id))?;
    let dairy = activities.create_activity("Молочная продукция", Some(food.id))?;
    activities.create_activity("Запчасти", Some(cars.id))?;
    activities.create_activity("Аксессуары", Some(cars.id))?;

    organizations.create_organization(
        SAMPLE_ORGANIZATION_NAME,
        &["+79991234567".to_string()],
        Some(headquarters.id),
        &[food.id, meat.id, dairy.id],
    )?;

    Ok(SeedOutcome::Inserted)
}
