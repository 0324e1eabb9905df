use puca_models::{Coordinates, FeatureCollection, FeatureReport};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument as _, debug, info, info_span};
use uuid::Uuid;

use crate::aggregate::{AggregateContext, aggregate, aggregate_defibrillators, aggregate_raw};
use crate::category::{Category, FilterFragment};
use crate::enrich::enrich_features;
use crate::geo::{compute_bounding_box, validate_radius};
use crate::query::build_query;
use crate::services::Upstream;

use super::{ControlError, Origin, PucaControlPlane, until_cancelled};

/// A category search around an origin.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySearch {
    pub origin: Origin,
    pub category: String,
    pub radius_m: Option<f64>,
}

impl CategorySearch {
    pub fn new(origin: Origin, category: impl Into<String>) -> Self {
        Self {
            origin,
            category: category.into(),
            radius_m: None,
        }
    }

    #[must_use]
    pub const fn with_radius(mut self, radius_m: Option<f64>) -> Self {
        self.radius_m = radius_m;
        self
    }
}

/// A search with a caller-supplied tag filter instead of a named category.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSearch {
    pub origin: Origin,
    pub filter: String,
    pub radius_m: Option<f64>,
}

impl<U: Upstream> PucaControlPlane<U> {
    /// Finds features of a named category around an origin and reports on them.
    ///
    /// # Errors
    /// Returns `ControlError` for unknown categories, invalid radii or
    /// coordinates, addresses that cannot be geocoded, spatial-store failures,
    /// and cancellation.
    pub async fn search_category(
        &self,
        request: CategorySearch,
        cancel: &CancellationToken,
    ) -> Result<FeatureReport, ControlError> {
        let span = info_span!(
            "search_category",
            request_id = %Uuid::new_v4(),
            category = %request.category,
        );
        until_cancelled(cancel, self.run_category(request, cancel))
            .instrument(span)
            .await
    }

    /// Runs a caller-supplied filter around an origin.
    ///
    /// # Errors
    /// Returns `ControlError` for rejected filters and the same failures as
    /// [`Self::search_category`].
    pub async fn search_raw(
        &self,
        request: RawSearch,
        cancel: &CancellationToken,
    ) -> Result<FeatureReport, ControlError> {
        let span = info_span!("search_raw", request_id = %Uuid::new_v4());
        until_cancelled(cancel, self.run_raw(request))
            .instrument(span)
            .await
    }

    async fn run_category(
        &self,
        request: CategorySearch,
        cancel: &CancellationToken,
    ) -> Result<FeatureReport, ControlError> {
        let category: Category = request.category.parse()?;
        let radius_m = self.radius(request.radius_m)?;
        let center = self.resolve_origin(&request.origin).await?;
        let features = self
            .fetch(&category.filter(), center, radius_m)
            .await?;

        let label = request.origin.label();
        let context = AggregateContext::new(radius_m, &label);
        let report = if category.requires_enrichment() {
            let enriched = enrich_features(
                self.upstream(),
                features.into_features(),
                center,
                &self.settings.enrichment,
                cancel,
            )
            .await?;
            aggregate_defibrillators(&enriched, context)
        } else {
            aggregate(&features, category, context)
        };

        info!(matches = report.match_count, "category search complete");
        Ok(report)
    }

    async fn run_raw(&self, request: RawSearch) -> Result<FeatureReport, ControlError> {
        let filter = FilterFragment::raw(&request.filter)?;
        let radius_m = self.radius(request.radius_m)?;
        let center = self.resolve_origin(&request.origin).await?;
        let features = self.fetch(&filter, center, radius_m).await?;

        let label = request.origin.label();
        let report = aggregate_raw(&features, AggregateContext::new(radius_m, &label));
        info!(matches = report.match_count, "raw search complete");
        Ok(report)
    }

    fn radius(&self, requested: Option<f64>) -> Result<f64, ControlError> {
        Ok(validate_radius(
            requested.unwrap_or(self.settings.default_radius_m),
        )?)
    }

    async fn fetch(
        &self,
        filter: &FilterFragment,
        center: Coordinates,
        radius_m: f64,
    ) -> Result<FeatureCollection, ControlError> {
        let bbox = compute_bounding_box(center, radius_m)?;
        let query = build_query(filter, &bbox);
        debug!(%center, radius_m, query = %query, "querying spatial store");
        Ok(self.upstream.execute(&query).await?)
    }
}
