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

#[tool_router(router = tool_router_building, vis = "pub")]
impl<U: Upstream> PucaMcp<U> {
    #[tool(description = "Get school buildings within a radius of a location.")]
    async fn get_schools(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::School, params, &context.ct).await
    }

    #[tool(description = "Get kindergarten buildings within a radius of a location.")]
    async fn get_kindergartens(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::Kindergarten, params, &context.ct).await
    }

    #[tool(description = "Get retail buildings within a radius of a location.")]
    async fn get_retail_buildings(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::Retail, params, &context.ct).await
    }

    #[tool(description = "Get buildings marked as vacant within a radius of a location, with the number of vacant buildings per square kilometre.")]
    async fn get_vacant_buildings(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::VacantBuilding, params, &context.ct).await
    }
}
