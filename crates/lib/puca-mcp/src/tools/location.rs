use puca_core::control::Origin;
use puca_core::services::Upstream;
use puca_models::Coordinates;
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

/// Parameters for geocoding an address.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddressParams {
    /// A street address or place name.
    pub address: String,
}

/// Parameters for reverse geocoding a point.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CoordinatesParams {
    /// Latitude between -90 and 90.
    pub latitude: f64,
    /// Longitude between -180 and 180.
    pub longitude: f64,
}

/// Parameters for the route distance between two addresses.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AddressPairParams {
    pub address1: String,
    pub address2: String,
}

/// Parameters for the route distance between two points.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CoordinatePairParams {
    pub lat1: f64,
    pub lon1: f64,
    pub lat2: f64,
    pub lon2: f64,
}

#[tool_router(router = tool_router_location, vis = "pub")]
impl<U: Upstream> PucaMcp<U> {
    #[tool(description = "Get the latitude and longitude of an address.")]
    async fn get_coordinates_for_address(
        &self,
        Parameters(params): Parameters<AddressParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        info!("get_coordinates_for_address tool invoked");
        let result = self
            .control()
            .geocode_address(&params.address, &context.ct)
            .await
            .map(|coords| {
                format!(
                    "Latitude: {}, Longitude: {}",
                    coords.latitude, coords.longitude
                )
            });
        helpers::tool_result(result)
    }

    #[tool(description = "Get the address nearest to a latitude and longitude.")]
    async fn get_address_by_coordinates(
        &self,
        Parameters(params): Parameters<CoordinatesParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        info!("get_address_by_coordinates tool invoked");
        let result = self
            .control()
            .reverse_geocode(params.latitude, params.longitude, &context.ct)
            .await
            .map(|address| format!("Address: {address}"));
        helpers::tool_result(result)
    }

    #[tool(description = "Get the route distance in metres between two addresses. Both addresses are geocoded and a route is found between them.")]
    async fn get_distance_between_addresses(
        &self,
        Parameters(params): Parameters<AddressPairParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        info!("get_distance_between_addresses tool invoked");
        let from = Origin::from_parts(Some(params.address1), None, None);
        let to = Origin::from_parts(Some(params.address2), None, None);
        let result = match (from, to) {
            (Ok(from), Ok(to)) => {
                self.control()
                    .distance_between(from, to, &context.ct)
                    .await
            }
            (Err(err), _) | (_, Err(err)) => Err(err),
        };
        helpers::tool_result(result)
    }

    #[tool(description = "Get the route distance in metres between two latitude and longitude pairs.")]
    async fn get_distance_between_coords(
        &self,
        Parameters(params): Parameters<CoordinatePairParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        info!("get_distance_between_coords tool invoked");
        let from = Origin::Coordinates(Coordinates::new(params.lat1, params.lon1));
        let to = Origin::Coordinates(Coordinates::new(params.lat2, params.lon2));
        helpers::tool_result(
            self.control()
                .distance_between(from, to, &context.ct)
                .await,
        )
    }
}
