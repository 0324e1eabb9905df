//! OSRM route-distance client.

use puca_models::Coordinates;
use serde_json::Value;

use crate::services::{UpstreamError, UpstreamResult};

pub const SERVICE: &str = "osrm";

/// Returns the length in metres of the best route between two points.
///
/// `base_url` is the route endpoint including the profile, e.g.
/// `https://router.project-osrm.org/route/v1/driving`.
///
/// # Errors
/// Returns `UpstreamError` if the request fails or the response is malformed.
pub async fn route_distance(
    client: &reqwest::Client,
    base_url: &str,
    from: Coordinates,
    to: Coordinates,
) -> UpstreamResult<Option<f64>> {
    let url = format!(
        "{}/{},{};{},{}",
        base_url.trim_end_matches('/'),
        from.longitude,
        from.latitude,
        to.longitude,
        to.latitude
    );
    let resp = client
        .get(url)
        .query(&[("overview", "false")])
        .send()
        .await
        .map_err(|err| UpstreamError::transport(SERVICE, err))?;

    let status = resp.status();
    // OSRM answers 400 with {"code": "NoRoute"} and similar for unroutable pairs.
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(UpstreamError::Status {
            service: SERVICE,
            status: status.as_u16(),
        });
    }
    let body: Value = resp
        .json()
        .await
        .map_err(|err| UpstreamError::malformed(SERVICE, err.to_string()))?;
    parse_route(&body)
}

fn parse_route(body: &Value) -> UpstreamResult<Option<f64>> {
    let code = body["code"]
        .as_str()
        .ok_or_else(|| UpstreamError::malformed(SERVICE, "response has no code"))?;
    if code != "Ok" {
        return Ok(None);
    }
    Ok(body["routes"]
        .as_array()
        .and_then(|routes| routes.first())
        .and_then(|route| route["distance"].as_f64()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_route_distance() {
        let body = serde_json::json!({
            "code": "Ok",
            "routes": [{ "distance": 1234.5, "duration": 100.0 }, { "distance": 9.0 }]
        });
        assert_eq!(parse_route(&body).expect("parses"), Some(1234.5));
    }

    #[test]
    fn no_route_is_unknown() {
        let body = serde_json::json!({ "code": "NoRoute", "message": "Impossible route" });
        assert_eq!(parse_route(&body).expect("parses"), None);
    }

    #[test]
    fn missing_code_is_malformed() {
        assert!(parse_route(&serde_json::json!({ "routes": [] })).is_err());
    }
}
