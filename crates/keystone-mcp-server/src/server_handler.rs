use crate::dispatcher;
use crate::errors::{McpError, TransportError};
use crate::schema_cache::SchemaCache;
use crate::session::SessionCookie;
use crate::transport::AuthenticatedTransport;
use reqwest::header::HeaderMap;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorCode, Implementation,
    InitializeRequestParam, InitializeResult, ListToolsResult, PaginatedRequestParam,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{Peer, RoleServer, ServerHandler, ServiceError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard, RwLock};
use tracing::{debug, error};
use url::Url;

/// How each session reaches the GraphQL endpoint
#[derive(Debug, Clone)]
pub struct Upstream {
    pub endpoint: Url,
    pub headers: HeaderMap,
    pub session_cookie: Option<String>,
    pub timeout: Option<Duration>,
}

impl Upstream {
    /// Open a transport seeded with the caller's cookie, or the configured one
    pub fn connect(
        &self,
        inbound: Option<&SessionCookie>,
    ) -> Result<AuthenticatedTransport, TransportError> {
        AuthenticatedTransport::builder()
            .endpoint(self.endpoint.clone())
            .headers(self.headers.clone())
            .maybe_initial_cookie(
                inbound
                    .map(|cookie| cookie.as_str().to_string())
                    .or_else(|| self.session_cookie.clone()),
            )
            .maybe_timeout(self.timeout)
            .build()
    }
}

/// Serves the tool registry to one MCP session.
///
/// Clones share the schema cache and peer list; [`Self::for_session`] gives a clone its
/// own transport so that sessions never see each other's cookies.
#[derive(Clone)]
pub struct KeystoneMcpServerHandler {
    cache: Arc<SchemaCache>,
    upstream: Upstream,
    session: Arc<Mutex<Option<AuthenticatedTransport>>>,
    peers: Arc<RwLock<Vec<Peer<RoleServer>>>>,
}

impl KeystoneMcpServerHandler {
    pub fn new(cache: Arc<SchemaCache>, upstream: Upstream) -> Self {
        Self {
            cache,
            upstream,
            session: Arc::new(Mutex::new(None)),
            peers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// A handler for a new session
    pub fn for_session(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            upstream: self.upstream.clone(),
            session: Arc::new(Mutex::new(None)),
            peers: Arc::clone(&self.peers),
        }
    }

    /// The session's transport, opened on first use.
    ///
    /// Holding the guard serializes calls within the session.
    async fn transport(
        &self,
        context: &RequestContext<RoleServer>,
    ) -> Result<MappedMutexGuard<'_, AuthenticatedTransport>, TransportError> {
        let mut session = self.session.lock().await;
        if session.is_none() {
            let cookie = SessionCookie::from_context(context);
            debug!(inbound_cookie = cookie.is_some(), "Opening session transport");
            *session = Some(self.upstream.connect(cookie.as_ref())?);
        }
        MutexGuard::try_map(session, Option::as_mut).map_err(|_| TransportError::Closed)
    }

    pub(crate) async fn notify_tool_list_changed(&self) {
        let mut peers = self.peers.write().await;
        if !peers.is_empty() {
            debug!(
                "Schema changed, notifying {} peers of tool change",
                peers.len()
            );
        }
        let mut retained_peers = Vec::new();
        for peer in peers.iter() {
            if !peer.is_transport_closed() {
                match peer.notify_tool_list_changed().await {
                    Ok(_) => retained_peers.push(peer.clone()),
                    Err(ServiceError::TransportSend(_) | ServiceError::TransportClosed) => {
                        error!("Failed to notify peer of tool list change - dropping peer");
                    }
                    Err(e) => {
                        error!("Failed to notify peer of tool list change {:?}", e);
                        retained_peers.push(peer.clone());
                    }
                }
            }
        }
        *peers = retained_peers;
    }
}

impl ServerHandler for KeystoneMcpServerHandler {
    async fn initialize(
        &self,
        _request: InitializeRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        let mut peers = self.peers.write().await;
        peers.push(context.peer);
        Ok(self.get_info())
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let transport = match self.transport(&context).await {
            Ok(transport) => transport,
            Err(error) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Error: {error}"
                ))]));
            }
        };

        let snapshot = self.cache.current(&transport).await;
        let result =
            dispatcher::call_tool(&snapshot.registry, &request.name, request.arguments, &transport)
                .await;
        drop(transport);

        if snapshot.tools_changed {
            self.notify_tool_list_changed().await;
        }
        Ok(result)
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let transport = self
            .transport(&context)
            .await
            .map_err(|error| McpError::new(ErrorCode::INTERNAL_ERROR, error.to_string(), None))?;
        let snapshot = self.cache.current(&transport).await;
        drop(transport);

        if snapshot.tools_changed {
            self.notify_tool_list_changed().await;
        }
        Ok(ListToolsResult {
            next_cursor: None,
            tools: snapshot.registry.list_tools(),
        })
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "Keystone MCP Server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_tool_list_changed()
                .build(),
            ..Default::default()
        }
    }
}
