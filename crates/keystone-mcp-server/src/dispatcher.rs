//! Routing tool calls to registered tools

use crate::errors::ToolError;
use crate::tools::Registry;
use crate::transport::AuthenticatedTransport;
use rmcp::model::{CallToolResult, Content, JsonObject};
use serde_json::Value;
use tracing::{debug, warn};

/// Call a tool by name.
///
/// Always yields exactly one text content item. Failures, including unknown tools, are
/// rendered as text starting with `Error:` and never escape.
pub async fn call_tool(
    registry: &Registry,
    name: &str,
    arguments: Option<JsonObject>,
    transport: &AuthenticatedTransport,
) -> CallToolResult {
    let input = Value::Object(arguments.unwrap_or_default());
    debug!(tool = name, %input, "Calling tool");

    let result = match registry.get(name) {
        Some(descriptor) => descriptor.origin.invoke(&input, transport).await,
        None => Err(ToolError::NotFound(name.to_string())),
    };

    result.unwrap_or_else(|error| {
        warn!(tool = name, %error, "Tool call failed");
        CallToolResult::error(vec![Content::text(format!("Error: {error}"))])
    })
}
