//! The Keystone MCP server

mod serve;

use crate::custom_scalar_map::CustomScalarMap;
use crate::errors::ServerError;
use crate::schema_cache::SchemaCache;
use crate::server_handler::{KeystoneMcpServerHandler, Upstream};
use crate::tools::ToolOptions;
use bon::bon;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use schemars::JsonSchema;
use serde::Deserialize;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

/// A Keystone MCP Server
pub struct Server {
    transport: Transport,
    upstream: Upstream,
    tools: ToolOptions,
    schema_ttl: Option<Duration>,
    custom_scalar_map: Option<CustomScalarMap>,
}

/// How MCP clients connect to the server
#[derive(Debug, Clone, Default, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transport {
    /// Use standard IO for server <> client communication
    #[default]
    Stdio,

    /// Host the MCP server on the supplied configuration, using SSE for communication
    Sse {
        /// The IP address to bind to
        #[serde(default = "defaults::address")]
        address: IpAddr,

        /// The port to bind to
        #[serde(default = "defaults::port")]
        port: u16,

        /// The path under which the SSE and message endpoints are mounted
        #[serde(default = "defaults::base_path")]
        base_path: String,
    },

    /// Host the MCP server on the configuration, using streamable HTTP messages
    StreamableHttp {
        /// The IP address to bind to
        #[serde(default = "defaults::address")]
        address: IpAddr,

        /// The port to bind to
        #[serde(default = "defaults::port")]
        port: u16,

        /// The path under which the MCP endpoint is mounted
        #[serde(default = "defaults::base_path")]
        base_path: String,
    },
}

mod defaults {
    use std::net::{IpAddr, Ipv4Addr};

    pub(super) fn address() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    pub(super) fn port() -> u16 {
        5000
    }

    pub(super) fn base_path() -> String {
        "/api/mcp".to_string()
    }
}

#[bon]
impl Server {
    #[builder]
    pub fn new(
        transport: Transport,
        endpoint: Url,
        #[builder(default)] headers: HeaderMap,
        session_cookie: Option<String>,
        timeout: Option<Duration>,
        #[builder(default)] tools: ToolOptions,
        schema_ttl: Option<Duration>,
        custom_scalar_map: Option<CustomScalarMap>,
    ) -> Self {
        let headers = {
            let mut headers = headers.clone();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            headers
        };
        Self {
            transport,
            upstream: Upstream {
                endpoint,
                headers,
                session_cookie,
                timeout,
            },
            tools,
            schema_ttl,
            custom_scalar_map,
        }
    }

    /// Introspect the endpoint, then serve MCP until shutdown.
    ///
    /// The server does not start if the schema cannot be introspected.
    pub async fn start(self) -> Result<(), ServerError> {
        let cache = {
            let transport = self.upstream.connect(None)?;
            SchemaCache::load(
                &transport,
                self.schema_ttl,
                self.tools,
                self.custom_scalar_map,
            )
            .await?
        };
        info!(endpoint = %self.upstream.endpoint, "GraphQL schema ready");

        let handler = KeystoneMcpServerHandler::new(Arc::new(cache), self.upstream);
        serve::serve(handler, self.transport).await
    }
}
