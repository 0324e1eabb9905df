//! Turns spatial-store results into per-category reports.

use std::collections::HashSet;
use std::f64::consts::PI;

use puca_models::schema::{
    METRIC_VACANT_PER_SQ_KM,
    TAG_ACCESS,
    TAG_CAPACITY,
    TAG_DEFIBRILLATOR_LOCATION,
    TAG_FEE,
    TAG_INDOOR,
    TAG_NAME,
    TAG_NAME_GA,
    TAG_OPERATOR,
    TAG_PARKING,
    TAG_SURFACE,
};
use puca_models::{Feature, FeatureCollection, FeatureReport, ReportMetric};

use crate::category::{Category, ReportStyle};
use crate::enrich::{Distance, EnrichedFeature};

/// Parking tags reported, in order, with their display labels.
const PARKING_FIELDS: &[(&str, &str)] = &[
    (TAG_NAME, "Name"),
    (TAG_PARKING, "Type"),
    (TAG_ACCESS, "Access"),
    (TAG_OPERATOR, "Operator"),
    (TAG_CAPACITY, "Capacity"),
    (TAG_FEE, "Cost"),
    (TAG_SURFACE, "Surface Type"),
];

const ADDRESS_PREVIEW_CHARS: usize = 30;
const NOT_KNOWN: &str = "Not known";
const UNKNOWN: &str = "Unknown";

/// Search parameters echoed back in report headlines.
#[derive(Debug, Clone, Copy)]
pub struct AggregateContext<'a> {
    pub radius_m: f64,
    pub origin_label: &'a str,
}

impl<'a> AggregateContext<'a> {
    #[must_use]
    pub const fn new(radius_m: f64, origin_label: &'a str) -> Self {
        Self {
            radius_m,
            origin_label,
        }
    }
}

/// Formats a category result.
///
/// Defibrillators are normally formatted from enriched features with
/// [`aggregate_defibrillators`]; passing them here reports every enrichment
/// field as unknown.
#[must_use]
pub fn aggregate(
    features: &FeatureCollection,
    category: Category,
    context: AggregateContext<'_>,
) -> FeatureReport {
    match category.style() {
        ReportStyle::Generic => generic_report(features, category, context),
        ReportStyle::Parking => parking_report(features, context),
        ReportStyle::VacantBuildings => vacant_report(features, context),
        ReportStyle::IrishStreetNames => irish_street_name_report(features, context),
        ReportStyle::Defibrillators => {
            let bare: Vec<EnrichedFeature> =
                features.iter().cloned().map(EnrichedFeature::bare).collect();
            aggregate_defibrillators(&bare, context)
        }
    }
}

/// Formats the result of a caller-supplied filter.
#[must_use]
pub fn aggregate_raw(features: &FeatureCollection, context: AggregateContext<'_>) -> FeatureReport {
    let lines: Vec<String> = features.iter().map(tag_line).collect();
    FeatureReport {
        headline: format!(
            "Found {} features matching the query within {} metres of {}.",
            lines.len(),
            context.radius_m,
            context.origin_label
        ),
        match_count: lines.len(),
        metrics: Vec::new(),
        lines,
    }
}

/// Formats enriched defibrillator results, one line per feature in input order.
#[must_use]
pub fn aggregate_defibrillators(
    features: &[EnrichedFeature],
    context: AggregateContext<'_>,
) -> FeatureReport {
    let lines: Vec<String> = features.iter().map(defibrillator_line).collect();
    FeatureReport {
        headline: format!(
            "{} defibrillators found within {} metre radius of {}.",
            lines.len(),
            context.radius_m,
            context.origin_label
        ),
        match_count: lines.len(),
        metrics: Vec::new(),
        lines,
    }
}

/// Matches per square kilometre of the circular search area.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn density_per_sq_km(count: usize, radius_m: f64) -> f64 {
    let area_sq_km = PI * radius_m * radius_m / 1_000_000.0;
    if area_sq_km > 0.0 {
        count as f64 / area_sq_km
    } else {
        0.0
    }
}

fn generic_report(
    features: &FeatureCollection,
    category: Category,
    context: AggregateContext<'_>,
) -> FeatureReport {
    let lines: Vec<String> = features.iter().map(tag_line).collect();
    FeatureReport {
        headline: format!(
            "There are {} {} within {} metres of {}.",
            lines.len(),
            category.label(),
            context.radius_m,
            context.origin_label
        ),
        match_count: lines.len(),
        metrics: Vec::new(),
        lines,
    }
}

fn parking_report(features: &FeatureCollection, context: AggregateContext<'_>) -> FeatureReport {
    let lines: Vec<String> = features.ways.iter().map(parking_line).collect();
    FeatureReport {
        headline: format!(
            "There are {} parking amenities within {} metres of {}.",
            lines.len(),
            context.radius_m,
            context.origin_label
        ),
        match_count: lines.len(),
        metrics: Vec::new(),
        lines,
    }
}

fn vacant_report(features: &FeatureCollection, context: AggregateContext<'_>) -> FeatureReport {
    let lines: Vec<String> = features.iter().map(tag_line).collect();
    let ratio = density_per_sq_km(lines.len(), context.radius_m);
    FeatureReport {
        headline: format!(
            "Found {} buildings marked as vacant within {} metres of {}.",
            lines.len(),
            context.radius_m,
            context.origin_label
        ),
        match_count: lines.len(),
        metrics: vec![ReportMetric {
            key: METRIC_VACANT_PER_SQ_KM.to_string(),
            value: ratio,
            summary: format!(
                "This corresponds to a ratio of {ratio:.2} vacant buildings per square kilometre."
            ),
        }],
        lines,
    }
}

fn irish_street_name_report(
    features: &FeatureCollection,
    context: AggregateContext<'_>,
) -> FeatureReport {
    let mut seen = HashSet::new();
    let mut lines = Vec::new();
    for way in &features.ways {
        let Some(name) = way.tags.get_non_empty(TAG_NAME) else {
            continue;
        };
        if seen.insert(name) {
            let irish = way.tags.get(TAG_NAME_GA).unwrap_or_default();
            lines.push(format!("{irish}, {name}, URL: {}", way.resource_url()));
        }
    }
    FeatureReport {
        headline: format!(
            "Found {} thoroughfares with an Irish name within {} metres of {}.",
            lines.len(),
            context.radius_m,
            context.origin_label
        ),
        match_count: lines.len(),
        metrics: Vec::new(),
        lines,
    }
}

/// `key: value` for every tag, then the resource URL.
fn tag_line(feature: &Feature) -> String {
    let mut parts: Vec<String> = feature
        .tags
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect();
    parts.push(format!("URL: {}", feature.resource_url()));
    parts.join(", ")
}

fn parking_line(way: &Feature) -> String {
    let mut parts: Vec<String> = PARKING_FIELDS
        .iter()
        .filter_map(|(key, label)| {
            way.tags
                .get_non_empty(key)
                .map(|value| format!("{label}: {value}"))
        })
        .collect();
    parts.push(format!("URL: {}", way.resource_url()));
    parts.join(", ")
}

fn defibrillator_line(enriched: &EnrichedFeature) -> String {
    let feature = &enriched.feature;
    let distance = match enriched.distance {
        Distance::Metres(metres) => format!("{} metres", metres.trunc()),
        Distance::Unknown => format!("{UNKNOWN} distance"),
    };
    let building = enriched.building_name.as_deref().unwrap_or_default();
    let address: String = enriched
        .address
        .as_deref()
        .unwrap_or(UNKNOWN)
        .chars()
        .take(ADDRESS_PREVIEW_CHARS)
        .collect();
    let (latitude, longitude) = feature.geometry.map_or_else(
        || (UNKNOWN.to_string(), UNKNOWN.to_string()),
        |at| (at.latitude.to_string(), at.longitude.to_string()),
    );
    format!(
        "{distance} away: {building} {address} Latitude: {latitude}, Longitude: {longitude}, Access: {}, Inside: {}, Find it: {} URL: {}",
        feature.tags.get(TAG_ACCESS).unwrap_or(NOT_KNOWN),
        feature.tags.get(TAG_INDOOR).unwrap_or(NOT_KNOWN),
        feature.tags.get(TAG_DEFIBRILLATOR_LOCATION).unwrap_or_default(),
        feature.resource_url()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use puca_models::{Coordinates, FeatureKind};

    const ORIGIN: &str = "9 Sugar Island, Newry";

    fn context(radius_m: f64) -> AggregateContext<'static> {
        AggregateContext::new(radius_m, ORIGIN)
    }

    fn street(id: i64, name: &str, irish: &str) -> Feature {
        Feature::new(id, FeatureKind::Way)
            .with_tag(TAG_NAME, name)
            .with_tag(TAG_NAME_GA, irish)
    }

    #[test]
    fn empty_results_are_a_successful_report() {
        let empty = FeatureCollection::default();
        for category in Category::all() {
            let report = aggregate(&empty, category, context(100.0));
            assert_eq!(report.match_count, 0, "{category}");
            assert!(report.lines.is_empty(), "{category}");
        }
        assert_eq!(aggregate_raw(&empty, context(100.0)).match_count, 0);
    }

    #[test]
    fn generic_lines_list_tags_in_order_with_url() {
        let mut features = FeatureCollection::default();
        features.push(
            Feature::new(42, FeatureKind::Node)
                .with_tag("amenity", "toilets")
                .with_tag("wheelchair", "yes"),
        );
        features.push(Feature::new(7, FeatureKind::Way).with_tag("amenity", "toilets"));
        let report = aggregate(&features, Category::Toilets, context(250.0));
        assert_eq!(
            report.headline,
            format!("There are 2 toilets within 250 metres of {ORIGIN}.")
        );
        assert_eq!(
            report.lines,
            vec![
                "amenity: toilets, wheelchair: yes, URL: https://openstreetmap.org/node/42",
                "amenity: toilets, URL: https://openstreetmap.org/way/7",
            ]
        );
    }

    #[test]
    fn parking_lines_only_include_present_fields() {
        let mut features = FeatureCollection::default();
        features.push(
            Feature::new(5, FeatureKind::Way)
                .with_tag("amenity", "parking")
                .with_tag(TAG_FEE, "yes")
                .with_tag(TAG_NAME, "Buttercrane")
                .with_tag(TAG_CAPACITY, ""),
        );
        features.push(Feature::new(9, FeatureKind::Node).with_tag("amenity", "parking"));
        let report = aggregate(&features, Category::Parking, context(100.0));
        assert_eq!(report.match_count, 1);
        assert_eq!(
            report.lines,
            vec!["Name: Buttercrane, Cost: yes, URL: https://openstreetmap.org/way/5"]
        );
    }

    #[test]
    fn vacant_density_uses_circular_area() {
        let mut features = FeatureCollection::default();
        for id in 0..5 {
            features.push(Feature::new(id, FeatureKind::Way).with_tag("vacant", "yes"));
        }
        let report = aggregate(&features, Category::VacantBuilding, context(100.0));
        let ratio = report
            .metric(METRIC_VACANT_PER_SQ_KM)
            .expect("ratio metric should be present");
        assert!((ratio - 159.154_943).abs() < 1e-3);
        assert_eq!(
            report.metrics[0].summary,
            "This corresponds to a ratio of 159.15 vacant buildings per square kilometre."
        );
        assert_eq!(report.lines.len(), 5);
    }

    #[test]
    fn density_is_zero_for_a_zero_radius() {
        assert!(density_per_sq_km(5, 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn irish_street_names_are_deduplicated_in_first_seen_order() {
        let mut features = FeatureCollection::default();
        features.push(street(1, "Main St", "An Phríomhshráid"));
        features.push(street(2, "Main St", "An Phríomhshráid"));
        features.push(street(3, "Church Rd", "Bóthar an Teampaill"));
        features.push(Feature::new(4, FeatureKind::Way).with_tag(TAG_NAME_GA, "Gan Ainm"));
        let report = aggregate(&features, Category::IrishStreetName, context(500.0));
        assert_eq!(report.match_count, 2);
        assert_eq!(
            report.lines,
            vec![
                "An Phríomhshráid, Main St, URL: https://openstreetmap.org/way/1",
                "Bóthar an Teampaill, Church Rd, URL: https://openstreetmap.org/way/3",
            ]
        );
        assert!(report.headline.starts_with("Found 2 thoroughfares"));
    }

    #[test]
    fn defibrillator_line_truncates_address_by_characters() {
        let feature = Feature::new(11, FeatureKind::Node)
            .with_geometry(Coordinates::new(54.17, -6.34))
            .with_tag(TAG_ACCESS, "yes")
            .with_tag(TAG_DEFIBRILLATOR_LOCATION, "Beside reception");
        let enriched = EnrichedFeature {
            feature,
            distance: Distance::Metres(212.7),
            address: Some("Ospidéal Dhún Pádraig, Bóthar an Iúir, An tIúr, Contae an Dúin".to_string()),
            building_name: Some("Town Hall".to_string()),
        };
        let report = aggregate_defibrillators(&[enriched], context(300.0));
        assert_eq!(
            report.lines[0],
            "212 metres away: Town Hall Ospidéal Dhún Pádraig, Bóthar  Latitude: 54.17, Longitude: -6.34, Access: yes, Inside: Not known, Find it: Beside reception URL: https://openstreetmap.org/node/11"
        );
        assert_eq!(
            report.headline,
            format!("1 defibrillators found within 300 metre radius of {ORIGIN}.")
        );
    }

    #[test]
    fn unenriched_defibrillators_use_sentinels() {
        let mut features = FeatureCollection::default();
        features.push(Feature::new(3, FeatureKind::Node));
        let report = aggregate(&features, Category::Defibrillator, context(100.0));
        assert_eq!(
            report.lines[0],
            "Unknown distance away:  Unknown Latitude: Unknown, Longitude: Unknown, Access: Not known, Inside: Not known, Find it:  URL: https://openstreetmap.org/node/3"
        );
    }

    #[test]
    fn raw_report_covers_all_feature_kinds() {
        let mut features = FeatureCollection::default();
        features.push(Feature::new(3, FeatureKind::Relation).with_tag("type", "route"));
        features.push(Feature::new(1, FeatureKind::Node));
        let report = aggregate_raw(&features, context(50.0));
        assert_eq!(report.match_count, 2);
        assert_eq!(report.lines[0], "URL: https://openstreetmap.org/node/1");
        assert_eq!(
            report.lines[1],
            "type: route, URL: https://openstreetmap.org/relation/3"
        );
    }
}
