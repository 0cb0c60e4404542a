//! Organization use-case service.
//!
//! # Responsibility
//! - Validate organization payloads and their references before writes.
//! - Coordinate activity subtree expansion and geo boxes into repository
//!   lookups.
//!
//! # Invariants
//! - Duplicate activity ids are rejected before the store is touched.
//! - Referenced buildings and activities must exist at validation time; a
//!   concurrent delete between check and write surfaces as a store
//!   constraint failure.
//! - Category search is subtree-inclusive and de-duplicated by
//!   organization id.

use crate::geo::{
    radius_bounding_box, validate_latitude, validate_longitude, BoundingBox, GeoError,
};
use crate::model::activity::ActivityId;
use crate::model::building::BuildingId;
use crate::model::organization::{
    normalize_organization_name, validate_phones, OrganizationId, OrganizationValidationError,
};
use crate::repo::activity_repo::ActivityRepository;
use crate::repo::building_repo::{BuildingRepoError, BuildingRepository};
use crate::repo::organization_repo::{
    OrganizationRecord, OrganizationRepoError, OrganizationRepository,
};
use crate::service::activity_service::{ActivityService, ActivityServiceError, MAX_TREE_DEPTH};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from organization service operations.
#[derive(Debug)]
pub enum OrganizationServiceError {
    /// Name or phone list failed validation.
    InvalidOrganization(OrganizationValidationError),
    /// Target organization does not exist.
    OrganizationNotFound(OrganizationId),
    /// Referenced building does not exist.
    BuildingNotFound(BuildingId),
    /// The same activity id appears more than once in an association list.
    DuplicateActivityId(ActivityId),
    /// One or more association ids do not resolve to existing activities.
    UnknownActivityIds(Vec<ActivityId>),
    /// Geo input failed validation.
    Geo(GeoError),
    /// Activity subtree expansion failed.
    Activity(ActivityServiceError),
    /// Repository-level failure.
    Repo(OrganizationRepoError),
}

impl Display for OrganizationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOrganization(err) => write!(f, "{err}"),
            Self::OrganizationNotFound(id) => write!(f, "organization not found: {id}"),
            Self::BuildingNotFound(id) => write!(f, "building not found: {id}"),
            Self::DuplicateActivityId(id) => {
                write!(f, "activity id {id} appears more than once")
            }
            Self::UnknownActivityIds(ids) => write!(f, "unknown activity ids: {ids:?}"),
            Self::Geo(err) => write!(f, "{err}"),
            Self::Activity(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OrganizationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidOrganization(err) => Some(err),
            Self::Geo(err) => Some(err),
            Self::Activity(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<OrganizationValidationError> for OrganizationServiceError {
    fn from(value: OrganizationValidationError) -> Self {
        Self::InvalidOrganization(value)
    }
}

impl From<GeoError> for OrganizationServiceError {
    fn from(value: GeoError) -> Self {
        Self::Geo(value)
    }
}

impl From<ActivityServiceError> for OrganizationServiceError {
    fn from(value: ActivityServiceError) -> Self {
        Self::Activity(value)
    }
}

impl From<OrganizationRepoError> for OrganizationServiceError {
    fn from(value: OrganizationRepoError) -> Self {
        match value {
            OrganizationRepoError::OrganizationNotFound(id) => Self::OrganizationNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<BuildingRepoError> for OrganizationServiceError {
    fn from(value: BuildingRepoError) -> Self {
        match value {
            BuildingRepoError::BuildingNotFound(id) => Self::BuildingNotFound(id),
            BuildingRepoError::Db(err) => Self::Repo(OrganizationRepoError::Db(err)),
            BuildingRepoError::ConstraintViolation(message) => {
                Self::Repo(OrganizationRepoError::ConstraintViolation(message))
            }
            BuildingRepoError::InvalidData(message) => {
                Self::Repo(OrganizationRepoError::InvalidData(message))
            }
        }
    }
}

/// Organization service facade composing the three stores.
pub struct OrganizationService<O, A, B>
where
    O: OrganizationRepository,
    A: ActivityRepository,
    B: BuildingRepository,
{
    repo: O,
    activities: ActivityService<A>,
    buildings: B,
}

impl<O, A, B> OrganizationService<O, A, B>
where
    O: OrganizationRepository,
    A: ActivityRepository,
    B: BuildingRepository,
{
    /// Creates a service from the organization repository, the activity
    /// service used for subtree expansion, and the building repository used
    /// for reference checks.
    pub fn new(repo: O, activities: ActivityService<A>, buildings: B) -> Self {
        Self {
            repo,
            activities,
            buildings,
        }
    }

    /// Creates one organization with phones and activity associations.
    ///
    /// Duplicate ids in `activity_ids` fail before any store access; every
    /// id must resolve to an existing activity and `building_id`, when
    /// given, to an existing building.
    pub fn create_organization(
        &self,
        name: impl Into<String>,
        phones: &[String],
        building_id: Option<BuildingId>,
        activity_ids: &[ActivityId],
    ) -> Result<OrganizationRecord, OrganizationServiceError> {
        let normalized = normalize_organization_name(&name.into())?;
        validate_phones(phones)?;
        ensure_no_duplicate_ids(activity_ids)?;

        if let Some(building_id) = building_id {
            self.ensure_building_exists(building_id)?;
        }
        self.ensure_activities_exist(activity_ids)?;

        self.repo
            .create_organization(normalized.as_str(), phones, building_id, activity_ids)
            .map_err(Into::into)
    }

    /// Applies the provided fields to one organization.
    ///
    /// `None` leaves a field untouched. `activity_ids` given as an empty
    /// slice clears all associations, which is distinct from `None`.
    pub fn update_organization(
        &self,
        id: OrganizationId,
        name: Option<String>,
        phones: Option<&[String]>,
        building_id: Option<BuildingId>,
        activity_ids: Option<&[ActivityId]>,
    ) -> Result<OrganizationRecord, OrganizationServiceError> {
        self.repo
            .get_organization(id)?
            .ok_or(OrganizationServiceError::OrganizationNotFound(id))?;

        let normalized = match name {
            Some(value) => Some(normalize_organization_name(&value)?),
            None => None,
        };
        if let Some(phones) = phones {
            validate_phones(phones)?;
        }
        if let Some(building_id) = building_id {
            self.ensure_building_exists(building_id)?;
        }
        if let Some(activity_ids) = activity_ids {
            ensure_no_duplicate_ids(activity_ids)?;
            self.ensure_activities_exist(activity_ids)?;
        }

        self.repo
            .update_organization(id, normalized.as_deref(), phones, building_id, activity_ids)
            .map_err(Into::into)
    }

    /// Loads one organization with its relations.
    pub fn get_organization(
        &self,
        id: OrganizationId,
    ) -> Result<Option<OrganizationRecord>, OrganizationServiceError> {
        self.repo.get_organization(id).map_err(Into::into)
    }

    /// Lists every organization.
    pub fn list_organizations(
        &self,
    ) -> Result<Vec<OrganizationRecord>, OrganizationServiceError> {
        self.repo.list_organizations().map_err(Into::into)
    }

    /// Deletes one organization together with its phones and associations.
    pub fn delete_organization(&self, id: OrganizationId) -> Result<(), OrganizationServiceError> {
        self.repo.delete_organization(id).map_err(Into::into)
    }

    /// Lists organizations tagged with the activity or any of its
    /// descendants.
    ///
    /// The subtree is expanded to [`MAX_TREE_DEPTH`] hops; each organization
    /// appears once no matter how many subtree activities it is tagged
    /// with. A missing activity yields an empty set.
    pub fn organizations_by_activity(
        &self,
        activity_id: ActivityId,
    ) -> Result<Vec<OrganizationRecord>, OrganizationServiceError> {
        let subtree = self.activities.subtree_ids(activity_id, MAX_TREE_DEPTH)?;
        if subtree.is_empty() {
            return Ok(Vec::new());
        }
        self.repo.find_by_activities(&subtree).map_err(Into::into)
    }

    /// Lists organizations housed in one building; an unknown building
    /// yields an empty set.
    pub fn organizations_by_building(
        &self,
        building_id: BuildingId,
    ) -> Result<Vec<OrganizationRecord>, OrganizationServiceError> {
        self.repo.find_by_building(building_id).map_err(Into::into)
    }

    /// Lists organizations whose building falls inside the approximate
    /// radius box around a point.
    pub fn organizations_in_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<Vec<OrganizationRecord>, OrganizationServiceError> {
        let bounds = radius_bounding_box(latitude, longitude, radius_km)?;
        self.repo.find_in_bounds(&bounds).map_err(Into::into)
    }

    /// Lists organizations whose building falls inside the rectangle,
    /// bounds inclusive.
    ///
    /// An inverted rectangle (min above max) matches nothing.
    pub fn organizations_in_rectangle(
        &self,
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    ) -> Result<Vec<OrganizationRecord>, OrganizationServiceError> {
        validate_latitude(min_lat)?;
        validate_latitude(max_lat)?;
        validate_longitude(min_lon)?;
        validate_longitude(max_lon)?;

        let bounds = BoundingBox {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        };
        self.repo.find_in_bounds(&bounds).map_err(Into::into)
    }

    fn ensure_building_exists(
        &self,
        building_id: BuildingId,
    ) -> Result<(), OrganizationServiceError> {
        self.buildings
            .get_building(building_id)?
            .ok_or(OrganizationServiceError::BuildingNotFound(building_id))?;
        Ok(())
    }

    fn ensure_activities_exist(
        &self,
        activity_ids: &[ActivityId],
    ) -> Result<(), OrganizationServiceError> {
        if activity_ids.is_empty() {
            return Ok(());
        }

        let found = self.activities.list_by_ids(activity_ids)?;
        if found.len() == activity_ids.len() {
            return Ok(());
        }

        let known: HashSet<ActivityId> = found.iter().map(|activity| activity.id).collect();
        let mut missing: Vec<ActivityId> = activity_ids
            .iter()
            .copied()
            .filter(|id| !known.contains(id))
            .collect();
        missing.sort_unstable();
        Err(OrganizationServiceError::UnknownActivityIds(missing))
    }
}

fn ensure_no_duplicate_ids(activity_ids: &[ActivityId]) -> Result<(), OrganizationServiceError> {
    let mut seen = HashSet::new();
    for activity_id in activity_ids {
        if !seen.insert(*activity_id) {
            return Err(OrganizationServiceError::DuplicateActivityId(*activity_id));
        }
    }
    Ok(())
}
