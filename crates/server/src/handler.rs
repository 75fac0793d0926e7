//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::host::Host;
use crate::tools::cache::{CacheDeleteParams, CacheMatchParams, delete_impl, keys_impl, match_impl};
use crate::tools::fetch::{SwFetchParams, fetch_impl};
use crate::tools::lifecycle::{activate_impl, install_impl, status_impl};

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
use shellcache_client::Network;

/// Host type served over MCP: the network is chosen at startup.
pub type SharedHost = Arc<Host<Arc<dyn Network>>>;

/// The main MCP server handler for shellcache.
#[derive(Clone)]
pub struct ShellCacheServer {
    host: SharedHost,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellCacheServer {
    /// Create a new server handler.
    pub fn new(host: SharedHost) -> Self {
        Self { host, tool_router: Self::tool_router() }
    }

    #[tool(description = "Fetch every app shell asset and store the set in the current cache generation. All-or-nothing.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.host).await
    }

    #[tool(description = "Activate the installed generation: delete every other generation and start intercepting fetches.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.host).await
    }

    /// Issue a client request through the proxy.
    ///
    /// Non-GET and cross-origin requests, and any request before activation,
    /// go straight to the network.
    #[tool(
        description = "Issue a request through the offline proxy. Returns status, headers, body and whether it came from cache, network, fallback or passthrough."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.host, params.0).await
    }

    #[tool(description = "Report lifecycle state, current generation, scope and strategy.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.host).await
    }

    #[tool(description = "List stored cache generations with entry counts, in creation order.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.host).await
    }

    #[tool(description = "Look up a stored response by URL without touching the network.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(&self.host, params.0).await
    }

    #[tool(description = "Delete a cache generation and all of its entries.")]
    async fn cache_delete(&self, params: Parameters<CacheDeleteParams>) -> Result<CallToolResult, McpError> {
        delete_impl(&self.host, params.0).await
    }
}

impl ServerHandler for ShellCacheServer {
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

#[cfg(test)]
mod tests {
    use super::*;
    use shellcache_client::OfflineProxy;
    use shellcache_client::fetch::scripted::ScriptedNetwork;
    use shellcache_core::{CacheDb, Deployment};

    async fn server() -> ShellCacheServer {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network: Arc<dyn Network> = Arc::new(ScriptedNetwork::new());
        let proxy = OfflineProxy::new(Arc::new(Deployment::default()), db, network).unwrap();
        ShellCacheServer::new(Arc::new(Host::new(proxy)))
    }

    #[tokio::test]
    async fn test_router_lists_all_tools() {
        let server = server().await;
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["cache_delete", "cache_keys", "cache_match", "sw_activate", "sw_fetch", "sw_install", "sw_status"]
        );
    }

    #[tokio::test]
    async fn test_server_info_names_binary() {
        let info = server().await.get_info();
        assert_eq!(info.server_info.name, "shellcache");
    }
}
