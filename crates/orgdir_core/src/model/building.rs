//! Building domain model.
//!
//! # Responsibility
//! - Define the building record organizations can be housed in.
//! - Validate addresses and WGS84 coordinates before any write.
//!
//! # Invariants
//! - `latitude` stays within [-90, 90], `longitude` within [-180, 180].
//! - Addresses are unique store-wide; the store enforces that, not this module.

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a building.
pub type BuildingId = i64;

/// A physical building with a point coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    /// Stable row id referenced from `Organization::building_id`.
    pub id: BuildingId,
    /// Postal address, unique store-wide.
    pub address: String,
    /// WGS84 latitude in degrees.
    pub latitude: f64,
    /// WGS84 longitude in degrees.
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildingValidationError {
    BlankAddress,
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl Display for BuildingValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankAddress => write!(f, "building address must not be blank"),
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} is outside [-90, 90]")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} is outside [-180, 180]")
            }
        }
    }
}

impl Error for BuildingValidationError {}

/// Trims and validates a building address.
pub fn normalize_address(raw: &str) -> Result<String, BuildingValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BuildingValidationError::BlankAddress);
    }
    Ok(trimmed.to_string())
}

/// Validates a coordinate pair.
///
/// # Contract
/// - Latitude must lie in [-90, 90], longitude in [-180, 180], inclusive.
/// - NaN fails both checks (range `contains` is false for NaN).
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), BuildingValidationError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(BuildingValidationError::LatitudeOutOfRange(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(BuildingValidationError::LongitudeOutOfRange(longitude));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_accept_inclusive_bounds() {
        assert!(validate_coordinates(-90.0, -180.0).is_ok());
        assert!(validate_coordinates(90.0, 180.0).is_ok());
        assert!(validate_coordinates(55.7558, 37.6173).is_ok());
    }

    #[test]
    fn coordinates_reject_out_of_range_values() {
        assert_eq!(
            validate_coordinates(90.0001, 0.0),
            Err(BuildingValidationError::LatitudeOutOfRange(90.0001))
        );
        assert_eq!(
            validate_coordinates(0.0, -180.5),
            Err(BuildingValidationError::LongitudeOutOfRange(-180.5))
        );
    }

    #[test]
    fn coordinates_reject_nan() {
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
        assert!(validate_coordinates(0.0, f64::NAN).is_err());
    }

    #[test]
    fn blank_address_is_rejected() {
        assert_eq!(
            normalize_address(" \t"),
            Err(BuildingValidationError::BlankAddress)
        );
        assert_eq!(normalize_address(" ул. Ленина, 1 ").unwrap(), "ул. Ленина, 1");
    }
}
