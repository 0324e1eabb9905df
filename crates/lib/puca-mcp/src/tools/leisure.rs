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

#[tool_router(router = tool_router_leisure, vis = "pub")]
impl<U: Upstream> PucaMcp<U> {
    #[tool(description = "Get sports pitches within a radius of a location.")]
    async fn get_pitches(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::Pitch, params, &context.ct).await
    }

    #[tool(description = "Get gyms and fitness centres within a radius of a location.")]
    async fn get_fitness_centres(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::FitnessCentre, params, &context.ct).await
    }

    #[tool(description = "Get hotels within a radius of a location.")]
    async fn get_hotels(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::Hotel, params, &context.ct).await
    }

    #[tool(description = "Get museums within a radius of a location.")]
    async fn get_museums(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::Museum, params, &context.ct).await
    }
}
