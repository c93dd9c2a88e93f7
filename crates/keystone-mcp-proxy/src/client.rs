use crate::server::ProxyServer;
use keystone_mcp_server::transport::CookieJar;
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::{
    ServiceExt,
    model::{ClientCapabilities, ClientInfo, Implementation},
    transport::StreamableHttpClientTransport,
};
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info};

/// An HTTP client that sends `cookie` and keeps every cookie the server sets
pub fn cookie_client(cookie: Option<&str>) -> Result<(reqwest::Client, Arc<CookieJar>), reqwest::Error> {
    let jar = Arc::new(CookieJar::new(cookie));
    let client = reqwest::Client::builder()
        .cookie_provider(Arc::clone(&jar))
        .build()?;
    Ok((client, jar))
}

pub async fn start_proxy_client(url: &str, cookie: Option<&str>) -> Result<(), Box<dyn Error>> {
    let (http_client, jar) = cookie_client(cookie)?;
    let transport = StreamableHttpClientTransport::with_client(
        http_client,
        StreamableHttpClientTransportConfig::with_uri(url.to_string()),
    );
    let client_info = ClientInfo {
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "keystone-mcp-proxy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };

    let client = match client_info.serve(transport).await {
        Ok(client) => client,
        Err(e) => {
            error!("[Proxy] client startup error: {:?}", e);
            return Err(e.into());
        }
    };

    info!(
        "[Proxy] Connected to server at {} with {} cookies",
        url,
        jar.fragments().len()
    );
    debug!("{:#?}", client.peer_info());

    let proxy_server = ProxyServer::new(client.peer().clone(), client.peer_info());
    let server = proxy_server.serve(stdio()).await?;

    server.waiting().await?;
    client.cancel().await?;
    Ok(())
}
