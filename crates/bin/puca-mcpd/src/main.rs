//! Daemon entry point for the puca MCP server.
//!
//! Loads configuration from the command line and environment, builds the
//! upstream HTTP clients, and either serves MCP (stdio or streamable HTTP) or
//! prints a single report in local mode.

mod config;
mod logging;
mod upstream;

use puca_core::control::{CategorySearch, Origin, PucaControlPlane};
use puca_mcp::server::{serve_stdio, serve_streamable_http};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::{LocalRequest, PucaConfig};
use crate::logging::init_tracing;
use crate::upstream::build_upstream;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = PucaConfig::from_args()?;
    init_tracing(&config)?;
    let upstream = build_upstream(&config)?;
    let settings = config.control_settings();

    if let Some(local) = config.local.clone() {
        let control = PucaControlPlane::from_arc(upstream, settings);
        return run_local(&control, local).await;
    }

    if config.enable_stdio {
        return serve_stdio(upstream, settings).await;
    }

    info!(addr = %config.mcp_http_addr, "starting puca MCP server");
    serve_streamable_http(upstream, settings, config.http_server_config()).await
}

async fn run_local<U: puca_core::services::Upstream>(
    control: &PucaControlPlane<U>,
    local: LocalRequest,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let request = CategorySearch::new(Origin::Address(local.address), local.category.as_str());
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    match control.search_category(request, &cancel).await {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(err) => {
            eprintln!("Error: {err}");
            Err(err.into())
        }
    }
}
