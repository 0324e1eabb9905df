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

#[tool_router(router = tool_router_emergency, vis = "pub")]
impl<U: Upstream> PucaMcp<U> {
    #[tool(description = "Get defibrillators (AEDs) within a radius of a location. Each result includes the route distance from the location, the nearest address and building, access, whether it is indoors and where to find it.")]
    async fn get_defibrillators(
        &self,
        Parameters(params): Parameters<AreaSearchParams>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.area_report(Category::Defibrillator, params, &context.ct).await
    }
}
