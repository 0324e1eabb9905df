use puca_core::category::Category;
use puca_core::control::{CategorySearch, Origin, RawSearch};
use puca_core::services::Upstream;
use rmcp::{
    ErrorData,
    RoleServer,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    service::RequestContext,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{PucaMcp, helpers};

/// Parameters for searching a category by name.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchCategoryParams {
    /// Category name as returned by `list_categories`, e.g. `toilets`.
    pub category: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Search radius in metres.
    pub distance: Option<f64>,
}

/// Parameters for running a caller-supplied Overpass QL filter.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct QueryOverpassParams {
    /// A single Overpass QL statement without the bounding box, e.g. `nwr["amenity"="bench"]`.
    pub filter: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Search radius in metres.
    pub distance: Option<f64>,
}

#[tool_router(router = tool_router_query, vis = "pub")]
impl<U: Upstream> PucaMcp<U> {
    #[tool(description = "Find features of any supported category around a location. Call list_categories for the accepted names.")]
    async fn search_category(
        &self,
        Parameters(params): Parameters<SearchCategoryParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(category = %params.category, "search_category tool invoked");
        // Name errors take precedence over a missing origin.
        if let Err(err) = params.category.parse::<Category>() {
            return helpers::tool_error(&err.into());
        }
        let origin = match Origin::from_parts(params.address, params.latitude, params.longitude) {
            Ok(origin) => origin,
            Err(err) => return helpers::tool_error(&err),
        };
        let request = CategorySearch::new(origin, params.category).with_radius(params.distance);
        helpers::tool_result(self.control().search_category(request, &context.ct).await)
    }

    #[tool(description = "Run a single Overpass QL filter statement inside a bounding box around a location and list every matching feature with its tags. Use when no dedicated tool fits.")]
    async fn query_overpass(
        &self,
        Parameters(params): Parameters<QueryOverpassParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(filter = %params.filter, "query_overpass tool invoked");
        let origin = match Origin::from_parts(params.address, params.latitude, params.longitude) {
            Ok(origin) => origin,
            Err(err) => return helpers::tool_error(&err),
        };
        let request = RawSearch {
            origin,
            filter: params.filter,
            radius_m: params.distance,
        };
        helpers::tool_result(self.control().search_raw(request, &context.ct).await)
    }
}
