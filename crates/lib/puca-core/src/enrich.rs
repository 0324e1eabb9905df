//! Per-feature enrichment with route distance, reverse address and building name.
//!
//! Every feature costs up to three upstream calls. Calls share one semaphore so
//! no more than [`EnrichmentConfig::concurrency`] are in flight for a request,
//! each call has its own timeout, and a failed call only blanks its own field.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt as _};
use puca_models::{Coordinates, Feature};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::services::{Upstream, UpstreamResult};

pub const DEFAULT_ENRICH_CONCURRENCY: usize = 8;
pub const DEFAULT_ENRICH_CALL_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_BUILDING_RADIUS_M: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichmentConfig {
    pub concurrency: usize,
    pub call_timeout: Duration,
    pub building_radius_m: f64,
}

impl EnrichmentConfig {
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub const fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_ENRICH_CONCURRENCY,
            call_timeout: DEFAULT_ENRICH_CALL_TIMEOUT,
            building_radius_m: DEFAULT_BUILDING_RADIUS_M,
        }
    }
}

/// Route distance from the search origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distance {
    Metres(f64),
    Unknown,
}

/// A feature together with whatever context could be looked up for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedFeature {
    pub feature: Feature,
    pub distance: Distance,
    pub address: Option<String>,
    pub building_name: Option<String>,
}

impl EnrichedFeature {
    /// A feature with every enrichment field at its sentinel.
    #[must_use]
    pub const fn bare(feature: Feature) -> Self {
        Self {
            feature,
            distance: Distance::Unknown,
            address: None,
            building_name: None,
        }
    }
}

/// The request was cancelled before enrichment finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Enriches every feature, returning results in input order.
///
/// # Errors
/// Returns `Cancelled` if `cancel` fires first; partial results are dropped.
pub async fn enrich_features<U: Upstream>(
    upstream: &U,
    features: Vec<Feature>,
    origin: Coordinates,
    config: &EnrichmentConfig,
    cancel: &CancellationToken,
) -> Result<Vec<EnrichedFeature>, Cancelled> {
    if features.is_empty() {
        return Ok(Vec::new());
    }
    let concurrency = config.concurrency.max(1);
    let semaphore = Semaphore::new(concurrency);
    let permits = &semaphore;

    let fan_out = stream::iter(features.into_iter().enumerate())
        .map(|(index, feature)| async move {
            let enriched = enrich_one(upstream, feature, origin, config, permits).await;
            (index, enriched)
        })
        .buffer_unordered(concurrency)
        .collect::<Vec<_>>();

    let mut results = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(Cancelled),
        results = fan_out => results,
    };

    // buffer_unordered yields in completion order
    results.sort_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, enriched)| enriched).collect())
}

async fn enrich_one<U: Upstream>(
    upstream: &U,
    feature: Feature,
    origin: Coordinates,
    config: &EnrichmentConfig,
    permits: &Semaphore,
) -> EnrichedFeature {
    let Some(at) = feature.geometry else {
        debug!(feature_id = feature.id, "feature has no geometry, skipping enrichment");
        return EnrichedFeature::bare(feature);
    };

    let (distance, address, building_name) = tokio::join!(
        guarded_call(permits, config.call_timeout, "route_distance", feature.id, || {
            upstream.route_distance(origin, at)
        }),
        guarded_call(permits, config.call_timeout, "geocode_reverse", feature.id, || {
            upstream.geocode_reverse(at)
        }),
        guarded_call(permits, config.call_timeout, "nearest_building_name", feature.id, || {
            upstream.nearest_building_name(at, config.building_radius_m)
        }),
    );

    EnrichedFeature {
        feature,
        distance: distance.map_or(Distance::Unknown, Distance::Metres),
        address,
        building_name,
    }
}

/// Runs one lookup under a permit and a timeout. Any failure reads as "not found".
async fn guarded_call<T, F, Fut>(
    permits: &Semaphore,
    timeout: Duration,
    lookup: &'static str,
    feature_id: i64,
    call: F,
) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = UpstreamResult<Option<T>>>,
{
    let Ok(_permit) = permits.acquire().await else {
        return None;
    };
    match tokio::time::timeout(timeout, call()).await {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            debug!(lookup, feature_id, error = %err, "enrichment lookup failed");
            None
        }
        Err(_) => {
            debug!(lookup, feature_id, "enrichment lookup timed out");
            None
        }
    }
}
