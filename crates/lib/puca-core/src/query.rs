//! Query documents for the spatial store and decoding of its responses.
//!
//! The store speaks Overpass QL. Documents are built from a fixed template and
//! treated as opaque once built; responses are the store's JSON output format.

use std::fmt;

use puca_models::{Coordinates, Feature, FeatureCollection, FeatureKind, Tags};
use serde::Deserialize;

use crate::category::FilterFragment;
use crate::services::{UpstreamError, UpstreamResult};

pub const OVERPASS_SERVICE: &str = "overpass";

/// Server-side time limit written into every document, in seconds.
pub const QUERY_TIMEOUT_SECS: u32 = 25;

/// A complete query ready to send to the spatial store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDocument(String);

impl QueryDocument {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds the bounded query for a filter. The bounding clause is ordered
/// (south, west, north, east) as the query grammar requires.
#[must_use]
pub fn build_query(filter: &FilterFragment, bbox: &puca_models::BoundingBox) -> QueryDocument {
    QueryDocument(format!(
        "[out:json][timeout:{QUERY_TIMEOUT_SECS}];\n(\n{filter} ({south}, {west}, {north}, {east});\n);\nout body;\n",
        south = bbox.bottom_right.latitude,
        west = bbox.top_left.longitude,
        north = bbox.top_left.latitude,
        east = bbox.bottom_right.longitude,
    ))
}

/// Builds a radius query around a point. Ways come back with a center point.
#[must_use]
pub fn build_around_query(filter: &str, center: Coordinates, radius_m: f64) -> QueryDocument {
    let element = filter.find('[').map_or(filter, |index| &filter[..index]);
    let tag_filters = &filter[element.len()..];
    QueryDocument(format!(
        "[out:json][timeout:{QUERY_TIMEOUT_SECS}];\n{element}(around:{radius_m}, {lat}, {lon}){tag_filters};\nout center;\n",
        lat = center.latitude,
        lon = center.longitude,
    ))
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassPoint>,
    #[serde(default)]
    tags: Tags,
}

#[derive(Debug, Deserialize)]
struct OverpassPoint {
    lat: f64,
    lon: f64,
}

impl OverpassElement {
    fn into_feature(self) -> Option<Feature> {
        let kind = match self.kind.as_str() {
            "node" => FeatureKind::Node,
            "way" => FeatureKind::Way,
            "relation" => FeatureKind::Relation,
            _ => return None,
        };
        let geometry = match (self.lat, self.lon, self.center) {
            (Some(lat), Some(lon), _) => Some(Coordinates::new(lat, lon)),
            (_, _, Some(center)) => Some(Coordinates::new(center.lat, center.lon)),
            _ => None,
        };
        Some(Feature {
            id: self.id,
            kind,
            tags: self.tags,
            geometry,
        })
    }
}

/// Decodes a spatial-store JSON body, partitioning elements by kind in input order.
///
/// # Errors
/// Returns `UpstreamError::Malformed` when the body is not the expected JSON shape.
pub fn parse_response(body: &[u8]) -> UpstreamResult<FeatureCollection> {
    let response: OverpassResponse = serde_json::from_slice(body)
        .map_err(|err| UpstreamError::malformed(OVERPASS_SERVICE, err.to_string()))?;
    let mut collection = FeatureCollection::default();
    for element in response.elements {
        if let Some(feature) = element.into_feature() {
            collection.push(feature);
        }
    }
    Ok(collection)
}
