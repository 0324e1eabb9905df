use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::schema::resource_url;

/// A WGS84 position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true when both values are finite and inside the WGS84 ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Axis-aligned search rectangle. `top_left` is the north-west corner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub top_left: Coordinates,
    pub bottom_right: Coordinates,
}

impl BoundingBox {
    #[must_use]
    pub const fn south(&self) -> f64 {
        self.bottom_right.latitude
    }

    #[must_use]
    pub const fn west(&self) -> f64 {
        self.top_left.longitude
    }

    #[must_use]
    pub const fn north(&self) -> f64 {
        self.top_left.latitude
    }

    #[must_use]
    pub const fn east(&self) -> f64 {
        self.bottom_right.longitude
    }

    /// Returns a copy with both corner longitudes wrapped into [-180, 180).
    #[must_use]
    pub fn wrapped(&self) -> Self {
        Self {
            top_left: Coordinates::new(
                self.top_left.latitude,
                wrap_longitude(self.top_left.longitude),
            ),
            bottom_right: Coordinates::new(
                self.bottom_right.latitude,
                wrap_longitude(self.bottom_right.longitude),
            ),
        }
    }
}

/// Wraps a finite longitude into [-180, 180).
#[must_use]
pub fn wrap_longitude(longitude: f64) -> f64 {
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}

/// Structural kind of a map feature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Node,
    Way,
    Relation,
}

impl FeatureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag map that keeps the order keys arrived in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<(String, String)>);

impl Tags {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the value for `key` when present and not blank.
    #[must_use]
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.trim().is_empty())
    }

    /// Inserts or replaces a tag. A replaced tag keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.0.iter_mut().find(|(candidate, _)| *candidate == key) {
            slot.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Self::new();
        for (key, value) in iter {
            tags.insert(key, value);
        }
        tags
    }
}

impl Serialize for Tags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TagsVisitor;

        impl<'de> Visitor<'de> for TagsVisitor {
            type Value = Tags;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of string tags")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Tags, A::Error> {
                let mut tags = Tags(Vec::with_capacity(access.size_hint().unwrap_or(0)));
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    tags.insert(key, value);
                }
                Ok(tags)
            }
        }

        deserializer.deserialize_map(TagsVisitor)
    }
}

/// A single object returned by the spatial store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    pub id: i64,
    pub kind: FeatureKind,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Coordinates>,
}

impl Feature {
    #[must_use]
    pub const fn new(id: i64, kind: FeatureKind) -> Self {
        Self {
            id,
            kind,
            tags: Tags::new(),
            geometry: None,
        }
    }

    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key, value);
        self
    }

    #[must_use]
    pub const fn with_geometry(mut self, geometry: Coordinates) -> Self {
        self.geometry = Some(geometry);
        self
    }

    #[must_use]
    pub fn resource_url(&self) -> String {
        resource_url(self.kind, self.id)
    }
}

/// Spatial store result, partitioned by feature kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    #[serde(default)]
    pub nodes: Vec<Feature>,
    #[serde(default)]
    pub ways: Vec<Feature>,
    #[serde(default)]
    pub relations: Vec<Feature>,
}

impl FeatureCollection {
    /// Appends a feature to the partition matching its kind.
    pub fn push(&mut self, feature: Feature) {
        match feature.kind {
            FeatureKind::Node => self.nodes.push(feature),
            FeatureKind::Way => self.ways.push(feature),
            FeatureKind::Relation => self.relations.push(feature),
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len() + self.ways.len() + self.relations.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates nodes, then ways, then relations.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.nodes
            .iter()
            .chain(self.ways.iter())
            .chain(self.relations.iter())
    }

    #[must_use]
    pub fn into_features(self) -> Vec<Feature> {
        let mut features = self.nodes;
        features.extend(self.ways);
        features.extend(self.relations);
        features
    }
}

/// A derived number reported alongside the feature lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportMetric {
    pub key: String,
    pub value: f64,
    pub summary: String,
}

/// Aggregated output for one query. Rendered to text only at the tool boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureReport {
    pub headline: String,
    pub match_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<ReportMetric>,
    #[serde(default)]
    pub lines: Vec<String>,
}

impl FeatureReport {
    #[must_use]
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|metric| metric.key == key)
            .map(|metric| metric.value)
    }

    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FeatureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.headline)?;
        for metric in &self.metrics {
            write!(f, "\n{}", metric.summary)?;
        }
        for line in &self.lines {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}
