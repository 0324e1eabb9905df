//! MCP tool modules.
//!
//! Tools are grouped by domain: location helpers, one tool per feature
//! category (amenity, building, leisure, emergency, thoroughfare), and the
//! generic category and raw query tools.

use puca_core::control::{ControlError, Origin};
use rmcp::schemars;
use serde::{Deserialize, Serialize};

pub mod amenity;
pub mod building;
pub mod emergency;
pub mod leisure;
pub mod location;
pub mod query;
pub mod thoroughfare;

/// Parameters shared by every area search tool.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AreaSearchParams {
    /// A street address or place name to search around.
    pub address: Option<String>,
    /// Latitude of the search centre, used with `longitude` instead of an address.
    pub latitude: Option<f64>,
    /// Longitude of the search centre, used with `latitude` instead of an address.
    pub longitude: Option<f64>,
    /// Search radius in metres.
    pub distance: Option<f64>,
}

impl AreaSearchParams {
    pub(crate) fn origin(&self) -> Result<Origin, ControlError> {
        Origin::from_parts(self.address.clone(), self.latitude, self.longitude)
    }
}
