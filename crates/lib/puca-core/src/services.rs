//! Contracts for the external collaborators the pipeline depends on.
//!
//! The geocoder, router, and spatial store are reached over HTTP in
//! production (see [`crate::clients`]) and replaced by in-process doubles in
//! tests.

use std::error::Error;
use std::fmt;
use std::future::Future;

use puca_models::{Coordinates, FeatureCollection};
use puca_models::schema::TAG_NAME;

use crate::query::{QueryDocument, build_around_query};

/// Filter used to find a named building next to a point.
pub const BUILDING_NAME_FILTER: &str = r#"way["building"]["name"]"#;

#[derive(Debug)]
pub enum UpstreamError {
    Transport {
        service: &'static str,
        source: Box<reqwest::Error>,
    },
    Status {
        service: &'static str,
        status: u16,
    },
    Malformed {
        service: &'static str,
        message: String,
    },
    Timeout {
        service: &'static str,
    },
}

impl UpstreamError {
    #[must_use]
    pub fn transport(service: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { service }
        } else {
            Self::Transport {
                service,
                source: Box::new(source),
            }
        }
    }

    #[must_use]
    pub fn malformed(service: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            service,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn service(&self) -> &'static str {
        match self {
            Self::Transport { service, .. }
            | Self::Status { service, .. }
            | Self::Malformed { service, .. }
            | Self::Timeout { service } => service,
        }
    }

    /// Everything except a 4xx other than 429 may succeed on retry. Overpass
    /// answers 200 with an HTML page when it is overloaded, so malformed bodies
    /// count as transient.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } | Self::Malformed { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { service, source } => {
                write!(f, "{service} request failed: {source}")
            }
            Self::Status { service, status } => {
                write!(f, "{service} responded with HTTP status {status}")
            }
            Self::Malformed { service, message } => {
                write!(f, "{service} returned an unexpected response: {message}")
            }
            Self::Timeout { service } => write!(f, "{service} request timed out"),
        }
    }
}

impl Error for UpstreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Address to coordinate lookups in both directions.
pub trait Geocoder: Send + Sync {
    /// Resolves a free-text address. `Ok(None)` means no match.
    fn geocode_forward(
        &self,
        address: &str,
    ) -> impl Future<Output = UpstreamResult<Option<Coordinates>>> + Send;

    /// Resolves a display address for a point. `Ok(None)` means no match.
    fn geocode_reverse(
        &self,
        at: Coordinates,
    ) -> impl Future<Output = UpstreamResult<Option<String>>> + Send;
}

/// Route distance between two points.
pub trait RouteService: Send + Sync {
    /// Returns the route length in metres, or `Ok(None)` when no route exists.
    fn route_distance(
        &self,
        from: Coordinates,
        to: Coordinates,
    ) -> impl Future<Output = UpstreamResult<Option<f64>>> + Send;
}

/// The tag-indexed spatial feature store.
pub trait SpatialStore: Send + Sync {
    fn execute(
        &self,
        query: &QueryDocument,
    ) -> impl Future<Output = UpstreamResult<FeatureCollection>> + Send;

    /// Name of the closest named building within `radius_m` of `at`.
    fn nearest_building_name(
        &self,
        at: Coordinates,
        radius_m: f64,
    ) -> impl Future<Output = UpstreamResult<Option<String>>> + Send {
        async move {
            let query = build_around_query(BUILDING_NAME_FILTER, at, radius_m);
            let found = self.execute(&query).await?;
            Ok(found
                .ways
                .iter()
                .find_map(|way| way.tags.get_non_empty(TAG_NAME))
                .map(str::to_string))
        }
    }
}

/// Every collaborator the pipeline needs, behind one handle.
pub trait Upstream: Geocoder + RouteService + SpatialStore + 'static {}

impl<T> Upstream for T where T: Geocoder + RouteService + SpatialStore + 'static {}
