//! Nominatim geocoder client.
//!
//! The public instance allows roughly one request per second and requires an
//! identifying `User-Agent`; both are the caller's responsibility.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use puca_models::Coordinates;
use serde_json::Value;

use crate::services::{UpstreamError, UpstreamResult};

pub const SERVICE: &str = "nominatim";

/// Forward-geocodes a free-text address, keeping only the best match.
///
/// # Errors
/// Returns `UpstreamError` if the request fails or the response is malformed.
pub async fn search(
    client: &reqwest::Client,
    base_url: &str,
    address: &str,
) -> UpstreamResult<Option<Coordinates>> {
    let body = get_json(
        client.get(format!("{}/search", base_url.trim_end_matches('/'))).query(&[
            ("q", address),
            ("format", "json"),
            ("limit", "1"),
        ]),
    )
    .await?;
    parse_search(&body)
}

/// Reverse-geocodes a point into a display address.
///
/// # Errors
/// Returns `UpstreamError` if the request fails or the response is malformed.
pub async fn reverse(
    client: &reqwest::Client,
    base_url: &str,
    at: Coordinates,
) -> UpstreamResult<Option<String>> {
    let body = get_json(
        client
            .get(format!("{}/reverse", base_url.trim_end_matches('/')))
            .query(&[
                ("lat", at.latitude.to_string()),
                ("lon", at.longitude.to_string()),
                ("format", "json".to_string()),
                ("extratags", "1".to_string()),
            ]),
    )
    .await?;
    parse_reverse(&body)
}

async fn get_json(request: reqwest::RequestBuilder) -> UpstreamResult<Value> {
    let resp = request
        .send()
        .await
        .map_err(|err| UpstreamError::transport(SERVICE, err))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(UpstreamError::Status {
            service: SERVICE,
            status: status.as_u16(),
        });
    }
    resp.json()
        .await
        .map_err(|err| UpstreamError::malformed(SERVICE, err.to_string()))
}

fn parse_search(body: &Value) -> UpstreamResult<Option<Coordinates>> {
    let results = body
        .as_array()
        .ok_or_else(|| UpstreamError::malformed(SERVICE, "search response is not an array"))?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = parse_coordinate(first, "lat")?;
    let lon = parse_coordinate(first, "lon")?;
    Ok(Some(Coordinates::new(lat, lon)))
}

fn parse_coordinate(entry: &Value, key: &str) -> UpstreamResult<f64> {
    entry[key]
        .as_str()
        .and_then(|raw| raw.parse::<f64>().ok())
        .or_else(|| entry[key].as_f64())
        .ok_or_else(|| UpstreamError::malformed(SERVICE, format!("missing {key} in search result")))
}

fn parse_reverse(body: &Value) -> UpstreamResult<Option<String>> {
    if !body.is_object() {
        return Err(UpstreamError::malformed(
            SERVICE,
            "reverse response is not an object",
        ));
    }
    // Points with nothing nearby come back as {"error": "Unable to geocode"}.
    Ok(body["display_name"]
        .as_str()
        .filter(|name| !name.trim().is_empty())
        .map(String::from))
}
