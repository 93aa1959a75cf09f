//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::AppState;
use crate::tools::cache::{CacheGetParams, CacheListParams, get_impl, list_impl};
use crate::tools::fetch::{FetchParams, fetch_impl};
use crate::tools::lifecycle::{InstallParams, activate_impl, install_impl, status_impl};
use crate::tools::message::{MessageParams, message_impl};

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
use shellcache_client::HttpNetwork;
use shellcache_core::CacheDb;

/// The main MCP server handler for shellcache.
#[derive(Clone)]
pub struct ShellcacheServer {
    state: Arc<AppState<CacheDb, HttpNetwork>>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellcacheServer {
    /// Create a new server handler.
    pub fn new(state: AppState<CacheDb, HttpNetwork>) -> Self {
        Self { state: Arc::new(state), tool_router: Self::tool_router() }
    }

    /// Install a new worker generation.
    ///
    /// Caches the asset manifest best-effort; a failed asset is reported but never aborts the install.
    #[tool(
        description = "Install a worker generation: precache the asset manifest (best-effort) and take over when skip-waiting applies. Returns cached and failed assets."
    )]
    async fn sw_install(&self, params: Parameters<InstallParams>) -> Result<CallToolResult, McpError> {
        install_impl(&self.state, params.0).await
    }

    #[tool(
        description = "Promote the waiting worker: delete caches from older generations and claim clients. Fails if nothing is waiting."
    )]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.state).await
    }

    /// Route a request through the active worker.
    #[tool(
        description = "Fetch a URL through the active worker. Reports the response, the routing policy used, and whether it came from network, cache, or fallback."
    )]
    async fn sw_fetch(&self, params: Parameters<FetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "Post a control message to the worker: {\"type\":\"SKIP_WAITING\"} or {\"type\":\"CACHE_URLS\",\"urls\":[...]}.")]
    async fn sw_message(&self, params: Parameters<MessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.state, params.0).await
    }

    #[tool(description = "Show the active and waiting worker generations and the entry count of every cache.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.state).await
    }

    /// List caches, or the keys in one cache.
    #[tool(description = "List cache names, or the request keys stored in one cache. Read-only.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(&self.state, params.0).await
    }

    /// Retrieve a stored entry.
    ///
    /// Looks the URL up without touching the network.
    #[tool(description = "Retrieve a cached response by URL, optionally scoped to one cache. Never touches the network.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.state, params.0).await
    }
}

impl ServerHandler for ShellcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
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
