use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use keystone_mcp_server::custom_scalar_map::CustomScalarMap;
use keystone_mcp_server::server::{Server, Transport};
use runtime::Config;
use tracing::{info, warn};

mod runtime;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Arguments to the MCP server
#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = STYLES,
    about = "Keystone MCP Server - expose a Keystone GraphQL API as MCP tools",
)]
struct Args {
    /// Path to the config file
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config: Config = match Args::parse().config {
        Some(config_path) => runtime::read_config(config_path)?,
        None => runtime::read_config_from_env()?,
    };

    let _guard = config.logging.setup()?;

    info!(
        "Keystone MCP Server v{} // Licensed under MIT",
        std::env!("CARGO_PKG_VERSION")
    );

    let custom_scalar_map = config
        .custom_scalars
        .as_deref()
        .map(|path| {
            CustomScalarMap::try_from(path)
                .with_context(|| format!("Failed to load custom scalars from {}", path.display()))
        })
        .transpose()?;

    if config.session_cookie.is_none() && config.transport == Transport::Stdio {
        warn!("No session cookie configured; stdio sessions will call the API anonymously");
    }

    Ok(Server::builder()
        .transport(config.transport)
        .endpoint(config.endpoint.into_inner())
        .headers(config.headers)
        .maybe_session_cookie(config.session_cookie)
        .maybe_timeout(config.timeout)
        .tools(config.tools)
        .maybe_schema_ttl(config.schema_cache.ttl)
        .maybe_custom_scalar_map(custom_scalar_map)
        .build()
        .start()
        .await?)
}
