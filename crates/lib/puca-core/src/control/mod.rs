use std::{error::Error, fmt, future::Future, sync::Arc};

use puca_models::Coordinates;
use tokio_util::sync::CancellationToken;

use crate::category::CategoryError;
use crate::enrich::{Cancelled, EnrichmentConfig};
use crate::geo::{GeoError, validate_coordinates};
use crate::services::{Upstream, UpstreamError};

pub mod location;
pub mod search;

pub use location::RouteDistance;
pub use search::{CategorySearch, RawSearch};

pub const DEFAULT_RADIUS_M: f64 = 100.0;

#[derive(Debug)]
pub enum ControlError {
    Validation(GeoError),
    Category(CategoryError),
    MissingOrigin,
    AddressNotFound(String),
    LocationNotFound(Coordinates),
    Upstream(UpstreamError),
    Cancelled,
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Category(err) => write!(f, "{err}"),
            Self::MissingOrigin => f.write_str(
                "A location is required: provide an address, or both a latitude and a longitude.",
            ),
            Self::AddressNotFound(address) => write!(
                f,
                "Unable to get valid coordinates for the address requested ({address}). Please check the spelling of the address."
            ),
            Self::LocationNotFound(at) => {
                write!(f, "Unable to find an address for the coordinates {at}.")
            }
            Self::Upstream(err) => write!(
                f,
                "The {} service could not complete the request: {err}",
                err.service()
            ),
            Self::Cancelled => f.write_str("The request was cancelled."),
        }
    }
}

impl Error for ControlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Category(err) => Some(err),
            Self::Upstream(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GeoError> for ControlError {
    fn from(err: GeoError) -> Self {
        Self::Validation(err)
    }
}

impl From<CategoryError> for ControlError {
    fn from(err: CategoryError) -> Self {
        Self::Category(err)
    }
}

impl From<UpstreamError> for ControlError {
    fn from(err: UpstreamError) -> Self {
        Self::Upstream(err)
    }
}

impl From<Cancelled> for ControlError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

/// Where a search is centred.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    Address(String),
    Coordinates(Coordinates),
}

impl Origin {
    /// Builds an origin from optional tool arguments. A full coordinate pair
    /// wins over an address; blank addresses count as missing.
    ///
    /// # Errors
    /// Returns `ControlError::MissingOrigin` when neither form is complete.
    pub fn from_parts(
        address: Option<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Self, ControlError> {
        if let (Some(latitude), Some(longitude)) = (latitude, longitude) {
            return Ok(Self::Coordinates(Coordinates::new(latitude, longitude)));
        }
        match address {
            Some(address) if !address.trim().is_empty() => {
                Ok(Self::Address(address.trim().to_string()))
            }
            _ => Err(ControlError::MissingOrigin),
        }
    }

    /// Text used to describe the origin in report headlines.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Address(address) => address.clone(),
            Self::Coordinates(coords) => coords.to_string(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => f.write_str(address),
            Self::Coordinates(coords) => write!(f, "{coords}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSettings {
    pub default_radius_m: f64,
    pub enrichment: EnrichmentConfig,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            default_radius_m: DEFAULT_RADIUS_M,
            enrichment: EnrichmentConfig::default(),
        }
    }
}

pub struct PucaControlPlane<U: Upstream> {
    upstream: Arc<U>,
    settings: ControlSettings,
}

impl<U: Upstream> Clone for PucaControlPlane<U> {
    fn clone(&self) -> Self {
        Self {
            upstream: Arc::clone(&self.upstream),
            settings: self.settings,
        }
    }
}

impl<U: Upstream> PucaControlPlane<U> {
    pub fn new(upstream: U, settings: ControlSettings) -> Self {
        Self::from_arc(Arc::new(upstream), settings)
    }

    pub const fn from_arc(upstream: Arc<U>, settings: ControlSettings) -> Self {
        Self { upstream, settings }
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    /// Turns an origin into validated coordinates, geocoding addresses.
    async fn resolve_origin(&self, origin: &Origin) -> Result<Coordinates, ControlError> {
        match origin {
            Origin::Coordinates(coords) => {
                Ok(validate_coordinates(coords.latitude, coords.longitude)?)
            }
            Origin::Address(address) => {
                let found = self
                    .upstream
                    .geocode_forward(address)
                    .await?
                    .ok_or_else(|| ControlError::AddressNotFound(address.clone()))?;
                validate_coordinates(found.latitude, found.longitude)
                    .map_err(|_| ControlError::AddressNotFound(address.clone()))
            }
        }
    }
}

/// Runs `work` unless `cancel` fires first.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = Result<T, ControlError>>,
) -> Result<T, ControlError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ControlError::Cancelled),
        result = work => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_win_over_address() {
        let origin = Origin::from_parts(Some("Newry".to_string()), Some(54.1), Some(-6.3))
            .expect("origin");
        assert_eq!(origin, Origin::Coordinates(Coordinates::new(54.1, -6.3)));
    }

    #[test]
    fn half_a_coordinate_pair_falls_back_to_address() {
        let origin =
            Origin::from_parts(Some(" Newry ".to_string()), Some(54.1), None).expect("origin");
        assert_eq!(origin, Origin::Address("Newry".to_string()));
    }

    #[test]
    fn blank_address_without_coordinates_is_missing() {
        let err = Origin::from_parts(Some("   ".to_string()), None, Some(-6.3))
            .expect_err("should be missing");
        assert!(matches!(err, ControlError::MissingOrigin));
    }

    #[test]
    fn labels_describe_the_origin() {
        assert_eq!(Origin::Address("Newry".to_string()).label(), "Newry");
        assert_eq!(
            Origin::Coordinates(Coordinates::new(54.1, -6.3)).label(),
            "54.1,-6.3"
        );
    }

    #[test]
    fn category_errors_surface_their_own_message() {
        let err = ControlError::from(CategoryError::Unknown("swimming_pool".to_string()));
        assert!(err.to_string().starts_with("Unknown category 'swimming_pool'"));
    }
}
