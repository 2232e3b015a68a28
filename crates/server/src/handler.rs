//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    SwFetchParams, SwSyncParams,
    cache::{CacheGetParams, get_impl, list_impl},
    fetch::fetch_impl,
    lifecycle::{activate_impl, install_impl},
    sync::sync_impl,
};

use haven_client::{Host, WorkerConfig};
use haven_core::CacheDb;
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

/// The main MCP server handler for haven.
#[derive(Clone)]
pub struct HavenServer {
    host: Arc<Host>,
    cache: CacheDb,
    config: Arc<WorkerConfig>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl HavenServer {
    /// Create a new server handler around a registered worker.
    pub fn new(host: Arc<Host>, cache: CacheDb, config: WorkerConfig) -> Self {
        Self { host, cache, config: Arc::new(config), tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Dispatch a request through the offline worker. Returns status, response type, headers, body and whether it came from cache, network or the fallback document."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.host, &self.config.origin, params.0).await
    }

    #[tool(description = "Run the install event: prefetch every configured resource into the current generation.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.host).await
    }

    #[tool(description = "Run the activate event: delete every stored generation except the current one.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.host).await
    }

    #[tool(description = "Deliver a background sync signal. Posts a timestamp to the sync endpoint for the configured tag.")]
    async fn sw_sync(&self, params: Parameters<SwSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.host, &self.config.sync_tag, params.0).await
    }

    #[tool(description = "List stored cache generations with entry counts.")]
    async fn cache_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(&self.cache, &self.config.version).await
    }

    #[tool(description = "Get metadata of a stored entry by URL from the current or a named generation.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.cache, &self.config.origin, &self.config.version, params.0).await
    }
}

impl ServerHandler for HavenServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "haven".into(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::host;

    #[tokio::test]
    async fn test_lists_all_tools() {
        let (host, _pages, db, config) = host("v1").await;
        let server = HavenServer::new(host, db, config);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(names, vec!["cache_get", "cache_list", "sw_activate", "sw_fetch", "sw_install", "sw_sync"]);
    }
}
