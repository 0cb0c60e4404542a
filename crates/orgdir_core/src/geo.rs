//! Planar bounding-box geometry for coordinate search.
//!
//! # Responsibility
//! - Turn a point-plus-radius query into an approximate coordinate box.
//! - Validate latitudes, longitudes and radii before they reach SQL.
//!
//! # Invariants
//! - A radius box always contains the exact circle for latitudes away from
//!   the poles; it is a superset, never a subset.
//! - Boxes are plain coordinate intervals. There is no antimeridian wrap,
//!   matching the inclusive BETWEEN filter the store runs.
//!
//! # See also
//! - `crate::repo::organization_repo` for the query that consumes the box.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Kilometers per degree of latitude (and of longitude at the equator).
pub const KILOMETERS_PER_DEGREE: f64 = 111.0;

/// Below this cosine magnitude the longitude window degenerates; fall back
/// to the latitude delta instead of dividing by a near-zero cosine.
pub const POLAR_COS_EPSILON: f64 = 1e-6;

/// Inclusive coordinate rectangle used by the store's geo queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Returns whether a point lies inside the box, bounds inclusive.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_lat
            && latitude <= self.max_lat
            && longitude >= self.min_lon
            && longitude <= self.max_lon
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    NonPositiveRadius(f64),
}

impl Display for GeoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} is outside [-90, 90]")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} is outside [-180, 180]")
            }
            Self::NonPositiveRadius(value) => {
                write!(f, "search radius {value} km must be positive")
            }
        }
    }
}

impl Error for GeoError {}

/// Validates a latitude in degrees. NaN fails the range check.
pub fn validate_latitude(value: f64) -> Result<(), GeoError> {
    if !(-90.0..=90.0).contains(&value) {
        return Err(GeoError::LatitudeOutOfRange(value));
    }
    Ok(())
}

/// Validates a longitude in degrees. NaN fails the range check.
pub fn validate_longitude(value: f64) -> Result<(), GeoError> {
    if !(-180.0..=180.0).contains(&value) {
        return Err(GeoError::LongitudeOutOfRange(value));
    }
    Ok(())
}

/// Builds the approximate bounding box around a point for a radius search.
///
/// # Contract
/// - `lat_delta = radius_km / 111`; `lon_delta` additionally divides by the
///   cosine of the latitude so the window widens toward the poles.
/// - When `|cos(lat)| < POLAR_COS_EPSILON` the longitude delta falls back to
///   the latitude delta instead of blowing up.
/// - The box is a superset of the true circle away from the poles; callers
///   must not assume geodesic precision at the corners.
pub fn radius_bounding_box(
    latitude: f64,
    longitude: f64,
    radius_km: f64,
) -> Result<BoundingBox, GeoError> {
    validate_latitude(latitude)?;
    validate_longitude(longitude)?;
    if radius_km.is_nan() || radius_km <= 0.0 {
        return Err(GeoError::NonPositiveRadius(radius_km));
    }

    let lat_delta = radius_km / KILOMETERS_PER_DEGREE;
    let cos_lat = latitude.to_radians().cos();
    let lon_delta = if cos_lat.abs() < POLAR_COS_EPSILON {
        lat_delta
    } else {
        radius_km / (KILOMETERS_PER_DEGREE * cos_lat)
    };

    Ok(BoundingBox {
        min_lat: latitude - lat_delta,
        max_lat: latitude + lat_delta,
        min_lon: longitude - lon_delta,
        max_lon: longitude + lon_delta,
    })
}
