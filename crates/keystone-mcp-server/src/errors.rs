use apollo_compiler::{Schema, validation::WithErrors};
use reqwest::StatusCode;
use serde_json::Value;
use std::net::SocketAddr;
use tokio::task::JoinError;

/// An error reaching the GraphQL endpoint
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("Failed to send GraphQL request: {0}")]
    Request(reqwest::Error),

    #[error("Failed to read GraphQL response body (HTTP {status}): {source}")]
    Decode {
        status: StatusCode,
        source: reqwest::Error,
    },

    #[error("The transport has been closed")]
    Closed,
}

/// An error fetching or rebuilding the GraphQL schema
#[derive(Debug, thiserror::Error)]
pub enum IntrospectionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Introspection request failed with HTTP {0}")]
    Status(StatusCode),

    #[error("GraphQL introspection failed: {0}")]
    GraphQL(String),

    #[error("Introspection response has no data")]
    MissingData,

    #[error("Invalid introspection result: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed introspection result: {0}")]
    Malformed(String),

    #[error("Introspected schema is invalid: {0}")]
    InvalidSchema(Box<WithErrors<Schema>>),
}

/// A GraphQL response that carried an `errors` array.
///
/// This is reported alongside the decoded body rather than returned as a failure, since
/// callers may still be able to use partial data.
#[derive(Debug, thiserror::Error)]
#[error("GraphQL execution returned errors: {}", messages(.errors))]
pub struct GraphQLExecutionError {
    pub errors: Vec<Value>,
}

fn messages(errors: &[Value]) -> String {
    errors
        .iter()
        .map(|error| {
            error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string())
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// An error while handling a single tool call
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool {0} not found")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotAllowed(String),

    #[error("Failed to serialize result: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// An error in server initialization
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Could not introspect the GraphQL endpoint: {0}")]
    Introspection(#[from] IntrospectionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Invalid model configuration: {0}")]
    ModelConfig(String),

    #[error("invalid custom_scalar_config: {0}")]
    CustomScalarConfig(serde_json::Error),

    #[error("invalid json schema: {0}")]
    CustomScalarJsonSchema(Value),

    #[error("Could not open file: {0}")]
    ReadFile(#[from] std::io::Error),

    #[error("Failed to listen on {address}: {source}")]
    Bind {
        address: SocketAddr,
        source: std::io::Error,
    },

    #[error("Failed to initialize MCP server: {0}")]
    McpInitialize(String),

    #[error("Failed to start server")]
    StartupError(#[from] JoinError),
}

/// An MCP tool error
pub type McpError = rmcp::model::ErrorData;
