//! wird-offline server entry point.
//!
//! Boots the offline cache controller and serves it over MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;
use wird_client::{ControllerConfig, FetchClient, FetchConfig, Registration};
use wird_core::{AppConfig, CacheDb};

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        origin = %config.origin,
        db_path = %config.db_path.display(),
        "starting wird-offline on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let registration = Arc::new(Registration::new(Arc::new(db), Arc::new(network)));

    let base = ControllerConfig::from_app(&config)?;
    if let Err(e) = registration.register(base.clone()).await {
        tracing::warn!(error = %e, "initial controller install failed, requests pass through");
    }

    let handler = handler::WirdServer::new(registration, base);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
