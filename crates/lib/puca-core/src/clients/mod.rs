//! HTTP implementations of the upstream collaborators.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use puca_models::{Coordinates, FeatureCollection};

use crate::query::QueryDocument;
use crate::retry::RetryPolicy;
use crate::services::{Geocoder, RouteService, SpatialStore, UpstreamResult};

pub mod nominatim;
pub mod osrm;
pub mod overpass;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org/route/v1/driving";
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_USER_AGENT: &str = concat!("puca-mcp/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub nominatim_url: String,
    pub osrm_url: String,
    pub overpass_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            osrm_url: DEFAULT_OSRM_URL.to_string(),
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug)]
pub struct ClientBuildError(reqwest::Error);

impl fmt::Display for ClientBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to build HTTP client: {}", self.0)
    }
}

impl Error for ClientBuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

/// Geocoder, router and spatial store reached over one shared HTTP client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl HttpUpstream {
    /// # Errors
    /// Returns `ClientBuildError` if the TLS backend cannot be initialised.
    pub fn new(config: UpstreamConfig) -> Result<Self, ClientBuildError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.request_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(ClientBuildError)?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub const fn config(&self) -> &UpstreamConfig {
        &self.config
    }
}

impl Geocoder for HttpUpstream {
    fn geocode_forward(
        &self,
        address: &str,
    ) -> impl Future<Output = UpstreamResult<Option<Coordinates>>> + Send {
        self.config.retry.run("geocode_forward", move || {
            nominatim::search(&self.client, &self.config.nominatim_url, address)
        })
    }

    fn geocode_reverse(
        &self,
        at: Coordinates,
    ) -> impl Future<Output = UpstreamResult<Option<String>>> + Send {
        self.config.retry.run("geocode_reverse", move || {
            nominatim::reverse(&self.client, &self.config.nominatim_url, at)
        })
    }
}

impl RouteService for HttpUpstream {
    fn route_distance(
        &self,
        from: Coordinates,
        to: Coordinates,
    ) -> impl Future<Output = UpstreamResult<Option<f64>>> + Send {
        self.config.retry.run("route_distance", move || {
            osrm::route_distance(&self.client, &self.config.osrm_url, from, to)
        })
    }
}

impl SpatialStore for HttpUpstream {
    fn execute(
        &self,
        query: &QueryDocument,
    ) -> impl Future<Output = UpstreamResult<FeatureCollection>> + Send {
        self.config.retry.run("overpass_query", move || {
            overpass::execute(&self.client, &self.config.overpass_url, query)
        })
    }
}
