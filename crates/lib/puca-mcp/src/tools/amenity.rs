use puca_core::category::Category;
use puca_core::services::Upstream;
use rmcp::{
    ErrorData,
    RoleServer,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    service::RequestContext,
    tool,
    tool_router,
};

use crate::PucaMcp;
use crate::tools::AreaSearchParams;

#[tool_router(router = tool_router_amenity, vis = "pub")]
impl<U: Upstream> PucaMcp<U> {
    #[tool(description = "Get details about parking within a radius of a location: name, type, access, operator, capacity, cost and surface where mapped.")]
    async fn get_parking(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::Parking, params, &context.ct).await
    }

    #[tool(description = "Get public toilets within a radius of a location.")]
    async fn get_toilets(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::Toilets, params, &context.ct).await
    }

    #[tool(description = "Get post offices within a radius of a location.")]
    async fn get_post_offices(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::PostOffice, params, &context.ct).await
    }

    #[tool(description = "Get cafes within a radius of a location.")]
    async fn get_cafes(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::Cafe, params, &context.ct).await
    }

    #[tool(description = "Get fast food places within a radius of a location.")]
    async fn get_fast_food_places(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::FastFood, params, &context.ct).await
    }

    #[tool(description = "Get community centres within a radius of a location.")]
    async fn get_community_centres(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::CommunityCentre, params, &context.ct).await
    }
}
