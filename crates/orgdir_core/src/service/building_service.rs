//! Building use-case service.
//!
//! # Responsibility
//! - Provide validated CRUD entry points for building administration.
//! - Delegate persistence to the building repository.
//!
//! # Invariants
//! - Addresses and coordinates are validated before any write.
//! - Service layer remains storage-agnostic.

use crate::model::building::{
    normalize_address, validate_coordinates, Building, BuildingId, BuildingValidationError,
};
use crate::repo::building_repo::{BuildingRepoError, BuildingRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from building service operations.
#[derive(Debug)]
pub enum BuildingServiceError {
    /// Address or coordinates failed validation.
    InvalidBuilding(BuildingValidationError),
    /// Target building does not exist.
    BuildingNotFound(BuildingId),
    /// Repository-level failure.
    Repo(BuildingRepoError),
}

impl Display for BuildingServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBuilding(err) => write!(f, "{err}"),
            Self::BuildingNotFound(id) => write!(f, "building not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BuildingServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidBuilding(err) => Some(err),
            Self::BuildingNotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<BuildingValidationError> for BuildingServiceError {
    fn from(value: BuildingValidationError) -> Self {
        Self::InvalidBuilding(value)
    }
}

impl From<BuildingRepoError> for BuildingServiceError {
    fn from(value: BuildingRepoError) -> Self {
        match value {
            BuildingRepoError::BuildingNotFound(id) => Self::BuildingNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Use-case service wrapper for building CRUD operations.
pub struct BuildingService<R: BuildingRepository> {
    repo: R,
}

impl<R: BuildingRepository> BuildingService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one building after validating address and coordinates.
    pub fn create_building(
        &self,
        address: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Result<Building, BuildingServiceError> {
        let normalized = normalize_address(&address.into())?;
        validate_coordinates(latitude, longitude)?;
        self.repo
            .create_building(normalized.as_str(), latitude, longitude)
            .map_err(Into::into)
    }

    /// Applies the provided fields to one building; `None` leaves a field as is.
    ///
    /// When only one coordinate is provided, the other keeps its stored
    /// value; the pair is validated against the stored row.
    pub fn update_building(
        &self,
        id: BuildingId,
        address: Option<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Building, BuildingServiceError> {
        let current = self
            .repo
            .get_building(id)?
            .ok_or(BuildingServiceError::BuildingNotFound(id))?;

        let normalized = match address {
            Some(value) => Some(normalize_address(&value)?),
            None => None,
        };
        validate_coordinates(
            latitude.unwrap_or(current.latitude),
            longitude.unwrap_or(current.longitude),
        )?;

        self.repo
            .update_building(id, normalized.as_deref(), latitude, longitude)
            .map_err(Into::into)
    }

    /// Loads one building.
    pub fn get_building(&self, id: BuildingId) -> Result<Option<Building>, BuildingServiceError> {
        self.repo.get_building(id).map_err(Into::into)
    }

    /// Lists every building.
    pub fn list_buildings(&self) -> Result<Vec<Building>, BuildingServiceError> {
        self.repo.list_buildings().map_err(Into::into)
    }

    /// Deletes one building. Buildings still housing organizations are
    /// refused by the store's reference constraint.
    pub fn delete_building(&self, id: BuildingId) -> Result<(), BuildingServiceError> {
        self.repo.delete_building(id).map_err(Into::into)
    }
}
