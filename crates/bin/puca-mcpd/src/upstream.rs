use std::sync::Arc;

use puca_core::clients::{ClientBuildError, HttpUpstream};
use tracing::info;

use crate::config::PucaConfig;

/// Builds the shared HTTP upstream used by every MCP session.
pub fn build_upstream(config: &PucaConfig) -> Result<Arc<HttpUpstream>, ClientBuildError> {
    let upstream = HttpUpstream::new(config.upstream_config())?;
    let ready = upstream.config();
    info!(
        nominatim = %ready.nominatim_url,
        osrm = %ready.osrm_url,
        overpass = %ready.overpass_url,
        retry_attempts = ready.retry.max_attempts,
        timeout_secs = ready.request_timeout.as_secs(),
        "upstream clients ready"
    );
    Ok(Arc::new(upstream))
}
