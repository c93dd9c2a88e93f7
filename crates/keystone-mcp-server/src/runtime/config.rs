use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use keystone_mcp_server::server::Transport;
use keystone_mcp_server::tools::ToolOptions;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use url::Url;

use super::{endpoint::Endpoint, logging::Logging};

/// Configuration for the MCP server
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Path to a JSON file mapping custom scalars to JSON Schemas
    pub custom_scalars: Option<PathBuf>,

    /// The Keystone GraphQL endpoint
    #[schemars(schema_with = "Url::json_schema")]
    pub endpoint: Endpoint,

    /// List of hard-coded headers to include in all GraphQL requests
    #[serde(deserialize_with = "header_map")]
    #[schemars(with = "std::collections::HashMap<String, String>")]
    pub headers: HeaderMap,

    /// Logging configuration
    pub logging: Logging,

    /// Schema cache configuration
    pub schema_cache: SchemaCacheConfig,

    /// Cookie sent with every GraphQL request of sessions that bring none of their own
    pub session_cookie: Option<String>,

    /// Timeout for each GraphQL request
    #[serde(deserialize_with = "humantime_serde::deserialize", default)]
    #[schemars(with = "Option<String>", default)]
    pub timeout: Option<Duration>,

    /// Tool configuration
    pub tools: ToolOptions,

    /// The type of server transport to use
    pub transport: Transport,
}

/// How long an introspected schema is served before it is fetched again
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaCacheConfig {
    /// Time to live of the cached schema; kept forever when unset
    #[serde(deserialize_with = "humantime_serde::deserialize", default)]
    #[schemars(with = "Option<String>", default)]
    pub ttl: Option<Duration>,
}

fn header_map<'de, D>(deserializer: D) -> Result<HeaderMap, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, String>::deserialize(deserializer)?
        .into_iter()
        .map(|(name, value)| {
            let name = HeaderName::from_str(&name).map_err(D::Error::custom)?;
            let value = HeaderValue::from_str(&value).map_err(D::Error::custom)?;
            Ok((name, value))
        })
        .collect()
}
