//! Bounding-box computation around a center point.

use std::{error::Error, fmt};

use puca_models::{BoundingBox, Coordinates};

pub use puca_models::wrap_longitude;

/// Approximate length of one degree of latitude.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Centers further from the equator than this are rejected; the longitude
/// offset grows with `1 / cos(latitude)` and diverges at the poles.
pub const MAX_ABS_LATITUDE: f64 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    InvalidCoordinates { latitude: f64, longitude: f64 },
    InvalidRadius(f64),
    LatitudeOutOfRange { latitude: f64, limit: f64 },
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCoordinates {
                latitude,
                longitude,
            } => write!(
                f,
                "Invalid coordinates {latitude},{longitude}: latitude must be between -90 and 90 and longitude between -180 and 180."
            ),
            Self::InvalidRadius(radius) => write!(
                f,
                "Invalid search radius {radius}: the distance must be a positive number of metres."
            ),
            Self::LatitudeOutOfRange { latitude, limit } => write!(
                f,
                "Latitude {latitude} is too close to a pole: searches are limited to latitudes between -{limit} and {limit}."
            ),
        }
    }
}

impl Error for GeoError {}

/// Checks a raw latitude/longitude pair and returns it as [`Coordinates`].
///
/// # Errors
/// Returns `GeoError::InvalidCoordinates` when either value is out of range or not finite.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<Coordinates, GeoError> {
    let coords = Coordinates::new(latitude, longitude);
    if coords.is_valid() {
        Ok(coords)
    } else {
        Err(GeoError::InvalidCoordinates {
            latitude,
            longitude,
        })
    }
}

/// Checks that a search radius is a finite, positive number of metres.
///
/// # Errors
/// Returns `GeoError::InvalidRadius` otherwise.
pub fn validate_radius(radius_m: f64) -> Result<f64, GeoError> {
    if radius_m.is_finite() && radius_m > 0.0 {
        Ok(radius_m)
    } else {
        Err(GeoError::InvalidRadius(radius_m))
    }
}

/// Computes the search rectangle around `center`.
///
/// Latitudes are clamped to [-90, 90]. Longitudes are not wrapped; a box crossing the antimeridian keeps corners
/// outside [-180, 180]. Use [`BoundingBox::wrapped`] to normalize them.
///
/// # Errors
/// Returns `GeoError` for invalid coordinates, a non-positive radius, or a
/// center beyond [`MAX_ABS_LATITUDE`].
pub fn compute_bounding_box(center: Coordinates, radius_m: f64) -> Result<BoundingBox, GeoError> {
    let center = validate_coordinates(center.latitude, center.longitude)?;
    let radius_m = validate_radius(radius_m)?;
    if center.latitude.abs() > MAX_ABS_LATITUDE {
        return Err(GeoError::LatitudeOutOfRange {
            latitude: center.latitude,
            limit: MAX_ABS_LATITUDE,
        });
    }

    let lat_offset = radius_m / METERS_PER_DEGREE;
    let lon_offset = radius_m / (METERS_PER_DEGREE * center.latitude.to_radians().cos().abs());

    Ok(BoundingBox {
        top_left: Coordinates::new(
            (center.latitude + lat_offset).min(90.0),
            center.longitude - lon_offset,
        ),
        bottom_right: Coordinates::new(
            (center.latitude - lat_offset).max(-90.0),
            center.longitude + lon_offset,
        ),
    })
}
