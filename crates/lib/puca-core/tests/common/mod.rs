#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use puca_core::control::{ControlSettings, PucaControlPlane};
use puca_core::enrich::EnrichmentConfig;
use puca_core::query::QueryDocument;
use puca_core::services::{
    Geocoder, RouteService, SpatialStore, UpstreamError, UpstreamResult,
};
use puca_models::{Coordinates, Feature, FeatureCollection, FeatureKind};
use rand::Rng as _;

pub const NEWRY: Coordinates = Coordinates::new(54.1751, -6.3402);

/// In-process stand-in for the geocoder, router and spatial store.
///
/// Enrichment calls sleep for a random delay up to `jitter`, so completion
/// order differs from request order.
#[derive(Default)]
pub struct FakeUpstream {
    pub addresses: HashMap<String, Coordinates>,
    pub features: FeatureCollection,
    pub failing_reverse: HashSet<u64>,
    pub stalled_reverse: HashSet<u64>,
    pub jitter: Duration,
    pub hang_enrichment: bool,
    pub store_calls: AtomicUsize,
    pub geocode_calls: AtomicUsize,
    pub enrichment_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: &str, at: Coordinates) -> Self {
        self.addresses.insert(address.to_string(), at);
        self
    }

    pub fn with_features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        for feature in features {
            self.features.push(feature);
        }
        self
    }

    pub fn with_failing_reverse(mut self, at: Coordinates) -> Self {
        self.failing_reverse.insert(at.latitude.to_bits());
        self
    }

    /// Reverse lookups at `at` sleep far longer than any test call timeout.
    pub fn with_stalled_reverse(mut self, at: Coordinates) -> Self {
        self.stalled_reverse.insert(at.latitude.to_bits());
        self
    }

    pub const fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub const fn hanging(mut self) -> Self {
        self.hang_enrichment = true;
        self
    }

    pub fn total_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
            + self.geocode_calls.load(Ordering::SeqCst)
            + self.enrichment_calls.load(Ordering::SeqCst)
    }

    async fn enrichment_delay(&self) -> InFlight<'_> {
        self.enrichment_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        if self.hang_enrichment {
            std::future::pending::<()>().await;
        }
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms > 0 {
            let delay = rand::thread_rng().gen_range(0..=jitter_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        guard
    }
}

impl Geocoder for FakeUpstream {
    async fn geocode_forward(&self, address: &str) -> UpstreamResult<Option<Coordinates>> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.addresses.get(address).copied())
    }

    async fn geocode_reverse(&self, at: Coordinates) -> UpstreamResult<Option<String>> {
        let _guard = self.enrichment_delay().await;
        if self.stalled_reverse.contains(&at.latitude.to_bits()) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.failing_reverse.contains(&at.latitude.to_bits()) {
            return Err(UpstreamError::Status {
                service: "nominatim",
                status: 503,
            });
        }
        Ok(Some(format!("{} Main Street, Newry", at.latitude)))
    }
}

impl RouteService for FakeUpstream {
    async fn route_distance(
        &self,
        from: Coordinates,
        to: Coordinates,
    ) -> UpstreamResult<Option<f64>> {
        let _guard = self.enrichment_delay().await;
        Ok(Some((to.latitude - from.latitude).abs() * 111_000.0))
    }
}

impl SpatialStore for FakeUpstream {
    async fn execute(&self, query: &QueryDocument) -> UpstreamResult<FeatureCollection> {
        if query.as_str().contains("(around:") {
            let _guard = self.enrichment_delay().await;
            let mut found = FeatureCollection::default();
            found.push(Feature::new(1, FeatureKind::Way).with_tag("name", "Town Hall"));
            return Ok(found);
        }
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.features.clone())
    }
}

pub fn defibrillator(id: i64, latitude: f64) -> Feature {
    Feature::new(id, FeatureKind::Node)
        .with_tag("emergency", "defibrillator")
        .with_tag("access", "yes")
        .with_geometry(Coordinates::new(latitude, -6.34))
}

pub fn control_plane(
    upstream: FakeUpstream,
    concurrency: usize,
) -> PucaControlPlane<FakeUpstream> {
    control_plane_with_timeout(upstream, concurrency, Duration::from_secs(2))
}

pub fn control_plane_with_timeout(
    upstream: FakeUpstream,
    concurrency: usize,
    call_timeout: Duration,
) -> PucaControlPlane<FakeUpstream> {
    let settings = ControlSettings {
        enrichment: EnrichmentConfig::default()
            .with_concurrency(concurrency)
            .with_call_timeout(call_timeout),
        ..ControlSettings::default()
    };
    PucaControlPlane::new(upstream, settings)
}
