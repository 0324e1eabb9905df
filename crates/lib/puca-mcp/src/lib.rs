//! MCP server implementation for puca-mcp.
//!
//! This crate wires the control plane into rmcp tool handlers: one tool per
//! feature category, location helpers, and a raw query escape hatch.

mod helpers;
mod tools;
pub mod server;

use std::sync::Arc;

use puca_core::category::Category;
use puca_core::control::{CategorySearch, ControlSettings, PucaControlPlane};
use puca_core::services::Upstream;
use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use tools::AreaSearchParams;

const SERVER_INSTRUCTIONS: &str = r#"puca-mcp answers questions about places near a location using OpenStreetMap data.

Locating a search:
- Area tools accept either an `address` (geocoded first) or a `latitude` and `longitude` pair.
  Coordinates win when both are given.
- `distance` is the search radius in metres. It defaults to the server's configured radius.

Tools:
- Amenities: `get_parking`, `get_toilets`, `get_post_offices`, `get_cafes`, `get_fast_food_places`,
  `get_community_centres`.
- Buildings: `get_schools`, `get_kindergartens`, `get_retail_buildings`, `get_vacant_buildings`.
- Leisure and tourism: `get_pitches`, `get_fitness_centres`, `get_hotels`, `get_museums`.
- Emergency: `get_defibrillators` adds route distance, address and building name per device.
- Streets: `get_irish_street_names`.
- Any category by name: `search_category` (see `list_categories`).
- Locations: `get_coordinates_for_address`, `get_address_by_coordinates`,
  `get_distance_between_addresses`, `get_distance_between_coords`.
- `query_overpass` runs a single Overpass QL filter such as `nwr["amenity"="bench"]`.

Notes:
- Results only include features mapped by OpenStreetMap volunteers.
- Every result line ends with the OpenStreetMap URL of the feature.
- `health` returns `ok`."#;

/// MCP server wrapper around the control plane and tool routers.
pub struct PucaMcp<U: Upstream> {
    tool_router: ToolRouter<Self>,
    control: PucaControlPlane<U>,
}

impl<U: Upstream> Clone for PucaMcp<U> {
    fn clone(&self) -> Self {
        Self {
            tool_router: self.tool_router.clone(),
            control: self.control.clone(),
        }
    }
}

impl<U: Upstream> PucaMcp<U> {
    /// Creates a new server around a control plane.
    #[must_use]
    pub fn new(control: PucaControlPlane<U>) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_location()
            + Self::tool_router_amenity()
            + Self::tool_router_building()
            + Self::tool_router_leisure()
            + Self::tool_router_emergency()
            + Self::tool_router_thoroughfare()
            + Self::tool_router_query();
        Self {
            tool_router,
            control,
        }
    }

    /// Creates a new server from a shared upstream handle.
    #[must_use]
    pub fn with_upstream(upstream: Arc<U>, settings: ControlSettings) -> Self {
        Self::new(PucaControlPlane::from_arc(upstream, settings))
    }

    pub const fn control(&self) -> &PucaControlPlane<U> {
        &self.control
    }

    /// Runs a category search for an area tool and renders the report.
    pub(crate) async fn area_report(
        &self,
        category: Category,
        params: AreaSearchParams,
        cancel: &CancellationToken,
    ) -> Result<CallToolResult, ErrorData> {
        info!(category = %category, "area tool invoked");
        let origin = match params.origin() {
            Ok(origin) => origin,
            Err(err) => return helpers::tool_error(&err),
        };
        let request = CategorySearch::new(origin, category.as_str()).with_radius(params.distance);
        helpers::tool_result(self.control.search_category(request, cancel).await)
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl<U: Upstream> PucaMcp<U> {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }

    #[tool(description = "List the feature categories accepted by search_category, with what each one finds.")]
    async fn list_categories(&self) -> Result<CallToolResult, ErrorData> {
        let text: String = Category::all()
            .map(|category| format!("{}: {}\n", category.as_str(), category.label()))
            .collect();
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl<U: Upstream> ServerHandler for PucaMcp<U> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
