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

#[tool_router(router = tool_router_thoroughfare, vis = "pub")]
impl<U: Upstream> PucaMcp<U> {
    #[tool(description = "Get the Irish language names of streets within a radius of a location, alongside their English names.")]
    async fn get_irish_street_names(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::IrishStreetName, params, &context.ct).await
    }
}
