use crate::models::FeatureKind;

pub const OSM_BASE_URL: &str = "https://openstreetmap.org";

pub const TAG_NAME: &str = "name";
pub const TAG_NAME_GA: &str = "name:ga";
pub const TAG_PARKING: &str = "parking";
pub const TAG_ACCESS: &str = "access";
pub const TAG_OPERATOR: &str = "operator";
pub const TAG_CAPACITY: &str = "capacity";
pub const TAG_FEE: &str = "fee";
pub const TAG_SURFACE: &str = "surface";
pub const TAG_INDOOR: &str = "indoor";
pub const TAG_DEFIBRILLATOR_LOCATION: &str = "defibrillator:location";

pub const METRIC_VACANT_PER_SQ_KM: &str = "vacant_per_sq_km";

pub fn resource_url(kind: FeatureKind, id: i64) -> String {
    format!("{OSM_BASE_URL}/{kind}/{id}")
}
