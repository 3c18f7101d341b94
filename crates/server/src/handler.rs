//! MCP server handler implementation.
//!
//! This module defines the main server handler that routes tool calls to the
//! controller registration. The server plays the part of the browser: it
//! issues page requests, posts page messages and signals when pages close.
use std::sync::Arc;

use crate::tools::{
    SwFetchParams, SwMessageParams, SwUpdateParams,
    fetch::fetch_impl,
    message::message_impl,
    status::status_impl,
    update::{activate_waiting_impl, update_impl},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use wird_client::{ControllerConfig, Registration};

/// The main MCP server handler for wird-offline.
#[derive(Clone)]
pub struct WirdServer {
    tool_router: ToolRouter<Self>,
    registration: Arc<Registration>,
    /// Configuration used when no generation is active yet.
    base: ControllerConfig,
}

#[tool_router]
impl WirdServer {
    /// Create a new server handler over a registration.
    pub fn new(registration: Arc<Registration>, base: ControllerConfig) -> Self {
        Self { tool_router: Self::tool_router(), registration, base }
    }

    #[tool(
        description = "Issue a page request through the offline controller. Returns the response, the strategy \
                       that answered it and whether it came from cache or network."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.registration, &self.base, params.0).await
    }

    #[tool(description = "Post a control message to the controller: SKIP_WAITING, GET_CACHE_SIZE or CLEAR_CACHE.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.registration, params.0).await
    }

    #[tool(description = "Show the active and waiting controller generations and the cache partitions in storage.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.registration).await
    }

    #[tool(
        description = "Install a controller with new version tags. \
                       It waits behind the active one unless skip_waiting is set."
    )]
    async fn sw_update(&self, params: Parameters<SwUpdateParams>) -> Result<CallToolResult, McpError> {
        update_impl(&self.registration, &self.base, params.0).await
    }

    #[tool(description = "Signal that every controlled page has closed, activating the waiting controller if any.")]
    async fn sw_activate_waiting(&self) -> Result<CallToolResult, McpError> {
        activate_waiting_impl(&self.registration).await
    }
}

impl ServerHandler for WirdServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "wird-offline".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
