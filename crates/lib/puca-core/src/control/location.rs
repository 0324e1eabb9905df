use std::fmt;

use puca_models::Coordinates;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument as _, info, info_span};
use uuid::Uuid;

use crate::geo::validate_coordinates;
use crate::services::Upstream;

use super::{ControlError, Origin, PucaControlPlane, until_cancelled};

/// Route length between two origins. `metres` is `None` when no route exists.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDistance {
    pub from: Origin,
    pub to: Origin,
    pub metres: Option<f64>,
}

impl fmt::Display for RouteDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.metres {
            Some(metres) => write!(
                f,
                "There are {metres} metres between {} and {}.",
                self.from, self.to
            ),
            None => write!(
                f,
                "Unknown distance between {} and {}: no route was found.",
                self.from, self.to
            ),
        }
    }
}

impl<U: Upstream> PucaControlPlane<U> {
    /// # Errors
    /// Returns `ControlError::AddressNotFound` when the geocoder has no match,
    /// and `Cancelled` if `cancel` fires first.
    pub async fn geocode_address(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<Coordinates, ControlError> {
        let span = info_span!("geocode_address", request_id = %Uuid::new_v4());
        let work = async {
            let origin = Origin::from_parts(Some(address.to_string()), None, None)?;
            let coords = self.resolve_origin(&origin).await?;
            info!(%coords, "address geocoded");
            Ok(coords)
        };
        until_cancelled(cancel, work).instrument(span).await
    }

    /// # Errors
    /// Returns `ControlError::Validation` for out-of-range input and
    /// `ControlError::LocationNotFound` when the geocoder has no match.
    pub async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
        cancel: &CancellationToken,
    ) -> Result<String, ControlError> {
        let span = info_span!("reverse_geocode", request_id = %Uuid::new_v4());
        let work = async {
            let at = validate_coordinates(latitude, longitude)?;
            self.upstream
                .geocode_reverse(at)
                .await?
                .ok_or(ControlError::LocationNotFound(at))
        };
        until_cancelled(cancel, work).instrument(span).await
    }

    /// Route distance between two origins, geocoding addresses first.
    ///
    /// # Errors
    /// Returns `ControlError` when either origin is invalid or cannot be
    /// geocoded, the router fails, or `cancel` fires.
    pub async fn distance_between(
        &self,
        from: Origin,
        to: Origin,
        cancel: &CancellationToken,
    ) -> Result<RouteDistance, ControlError> {
        let span = info_span!("distance_between", request_id = %Uuid::new_v4());
        let work = async {
            let start = self.resolve_origin(&from).await?;
            let end = self.resolve_origin(&to).await?;
            let metres = self.upstream.route_distance(start, end).await?;
            info!(?metres, "route distance resolved");
            Ok(RouteDistance { from, to, metres })
        };
        until_cancelled(cancel, work).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_known_and_unknown_distances() {
        let from = Origin::Address("Newry".to_string());
        let to = Origin::Coordinates(Coordinates::new(54.0, -6.4));
        let known = RouteDistance {
            from: from.clone(),
            to: to.clone(),
            metres: Some(1520.4),
        };
        assert_eq!(
            known.to_string(),
            "There are 1520.4 metres between Newry and 54,-6.4."
        );
        let unknown = RouteDistance {
            from,
            to,
            metres: None,
        };
        assert!(unknown.to_string().starts_with("Unknown distance"));
    }
}
