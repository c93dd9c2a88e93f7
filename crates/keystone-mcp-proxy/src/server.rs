use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, InitializeRequestParam, InitializeResult,
    ListToolsResult, PaginatedRequestParam, ServerInfo,
};
use rmcp::service::{NotificationContext, RequestContext};
use rmcp::model::ErrorData;
use rmcp::{Peer, RoleClient, RoleServer, ServerHandler};
use std::sync::Arc;
use tracing::{debug, error};

/// Serves the tools of a remote MCP server
pub struct ProxyServer {
    client: Arc<Peer<RoleClient>>,
    server_info: Arc<ServerInfo>,
}

impl ProxyServer {
    pub fn new(client_peer: Peer<RoleClient>, peer_info: Option<&ServerInfo>) -> Self {
        let server_info = peer_info.cloned().unwrap_or_default();
        debug!("[Proxy] server info: {:?}", server_info);

        Self {
            client: Arc::new(client_peer),
            server_info: Arc::new(server_info),
        }
    }

    fn require_tools(&self) -> Result<(), ErrorData> {
        if self.server_info.capabilities.tools.is_none() {
            error!("[Proxy] Server doesn't support the tools capability");
            return Err(ErrorData::internal_error(
                "Server doesn't support the tools capability".to_string(),
                None,
            ));
        }
        Ok(())
    }
}

impl ServerHandler for ProxyServer {
    async fn initialize(
        &self,
        _request: InitializeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, ErrorData> {
        Ok(self.get_info())
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.require_tools()?;

        match self.client.call_tool(request).await {
            Ok(result) => {
                debug!("[Proxy] Tool call succeeded: {:?}", result);
                Ok(result)
            }
            Err(err) => {
                error!("[Proxy] Error calling tool: {:?}", err);
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Error: {err}"
                ))]))
            }
        }
    }

    async fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        self.require_tools()?;

        match self.client.list_tools(request).await {
            Ok(result) => {
                debug!(
                    "Proxying list_tools response with {} tools",
                    result.tools.len()
                );
                Ok(result)
            }
            Err(err) => {
                error!("[Proxy] Error listing tools: {:?}", err);
                Ok(ListToolsResult::default())
            }
        }
    }

    async fn on_cancelled(
        &self,
        notification: rmcp::model::CancelledNotificationParam,
        _context: NotificationContext<RoleServer>,
    ) {
        if let Err(err) = self.client.notify_cancelled(notification).await {
            error!("[Proxy] Error notifying cancelled: {:?}", err);
        }
    }

    fn get_info(&self) -> ServerInfo {
        self.server_info.as_ref().clone()
    }
}
