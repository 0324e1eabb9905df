//! Overpass spatial-store client.

use puca_models::FeatureCollection;

use crate::query::{OVERPASS_SERVICE, QueryDocument, parse_response};
use crate::services::{UpstreamError, UpstreamResult};

/// Sends a query document to the interpreter endpoint and decodes the result.
///
/// # Errors
/// Returns `UpstreamError` if the request fails, the store rejects the query,
/// or the body cannot be decoded.
pub async fn execute(
    client: &reqwest::Client,
    interpreter_url: &str,
    query: &QueryDocument,
) -> UpstreamResult<FeatureCollection> {
    let resp = client
        .get(interpreter_url)
        .query(&[("data", query.as_str())])
        .send()
        .await
        .map_err(|err| UpstreamError::transport(OVERPASS_SERVICE, err))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(UpstreamError::Status {
            service: OVERPASS_SERVICE,
            status: status.as_u16(),
        });
    }
    let body = resp
        .bytes()
        .await
        .map_err(|err| UpstreamError::transport(OVERPASS_SERVICE, err))?;
    parse_response(&body)
}
