use clap::Parser;
use keystone_mcp_proxy::client::start_proxy_client;
use std::error::Error;
use tracing::error;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Serve a remote Keystone MCP server over stdio, keeping its session cookies
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Streamable HTTP URL of the remote MCP server
    #[arg(short, long, env = "KEYSTONE_MCP_URL")]
    url: String,

    /// Cookie to send with the first request, e.g. `keystonejs-session=...`
    #[arg(short, long, env = "KEYSTONE_MCP_COOKIE")]
    cookie: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // stdout carries MCP messages
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("keystone_mcp_proxy")
        .filename_suffix("log")
        .build("./logs")?;

    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking_writer))
        .init();

    let args = Args::parse();

    if let Err(e) = start_proxy_client(&args.url, args.cookie.as_deref()).await {
        error!("[Proxy] exited with error: {e}");
        return Err(e);
    }

    Ok(())
}
