use super::Transport;
use crate::errors::ServerError;
use crate::server_handler::KeystoneMcpServerHandler;
use crate::session::capture_session_cookie;
use axum::{Router, middleware};
use rmcp::ServiceExt as _;
use rmcp::transport::sse_server::SseServerConfig;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::{SseServer, StreamableHttpService, stdio};
use std::net::{IpAddr, SocketAddr};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{Instrument as _, error, info};

pub(super) async fn serve(
    handler: KeystoneMcpServerHandler,
    transport: Transport,
) -> Result<(), ServerError> {
    match transport {
        Transport::StreamableHttp {
            address,
            port,
            base_path,
        } => serve_streamable_http(handler, address, port, &base_path).await,
        Transport::Sse {
            address,
            port,
            base_path,
        } => serve_sse(handler, address, port, &base_path).await,
        Transport::Stdio => serve_stdio(handler).await,
    }
}

fn mount_path(base_path: &str, endpoint: &str) -> String {
    format!("{}/{endpoint}", base_path.trim_end_matches('/'))
}

async fn bind(address: SocketAddr) -> Result<tokio::net::TcpListener, ServerError> {
    tokio::net::TcpListener::bind(address)
        .await
        .map_err(|source| ServerError::Bind { address, source })
}

async fn serve_streamable_http(
    handler: KeystoneMcpServerHandler,
    address: IpAddr,
    port: u16,
    base_path: &str,
) -> Result<(), ServerError> {
    let path = mount_path(base_path, "mcp");
    info!(port = ?port, address = ?address, %path, "Starting MCP server in Streamable HTTP mode");
    let service = StreamableHttpService::new(
        move || Ok(handler.for_session()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = Router::new()
        .nest_service(&path, service)
        .layer(middleware::from_fn(capture_session_cookie))
        .layer(TraceLayer::new_for_http());

    let listener = bind(SocketAddr::new(address, port)).await?;
    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Failed to serve MCP server: {e:?}");
    }
    Ok(())
}

async fn serve_sse(
    handler: KeystoneMcpServerHandler,
    address: IpAddr,
    port: u16,
    base_path: &str,
) -> Result<(), ServerError> {
    info!(port = ?port, address = ?address, %base_path, "Starting MCP server in SSE mode");
    let cancellation_token = CancellationToken::new();
    let (server, router) = SseServer::new(SseServerConfig {
        bind: SocketAddr::new(address, port),
        sse_path: mount_path(base_path, "sse"),
        post_path: mount_path(base_path, "message"),
        ct: cancellation_token.clone(),
        sse_keep_alive: None,
    });
    let router = router
        .layer(middleware::from_fn(capture_session_cookie))
        .layer(TraceLayer::new_for_http());

    // Serve the layered router ourselves instead of SseServer::serve_with_config
    let listener = bind(server.config.bind).await?;
    let ct = server.config.ct.child_token();
    let axum_server = axum::serve(listener, router).with_graceful_shutdown(async move {
        ct.cancelled().await;
        info!("mcp server cancelled");
    });
    let bind_address = server.config.bind;
    let running = tokio::spawn(
        async move {
            if let Err(e) = axum_server.await {
                error!(error = %e, "mcp shutdown with error");
            }
        }
        .instrument(tracing::info_span!("mcp-server", bind_address = %bind_address)),
    );

    let _ct = server.with_service(move || handler.for_session());

    shutdown_signal().await;
    cancellation_token.cancel();
    running.await?;
    Ok(())
}

async fn serve_stdio(handler: KeystoneMcpServerHandler) -> Result<(), ServerError> {
    info!("Starting MCP server in stdio mode");
    let service = handler
        .for_session()
        .serve(stdio())
        .await
        .inspect_err(|e| {
            error!("serving error: {:?}", e);
        })
        .map_err(|e| ServerError::McpInitialize(e.to_string()))?;
    service.waiting().await?;
    Ok(())
}

#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
