use crate::introspection::SchemaHandle;
use crate::schema_from_type;
use rmcp::model::{CallToolResult, Content, Tool};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

/// The name of the tool to print the GraphQL schema
pub const INTROSPECT_TOOL_NAME: &str = "introspect_schema";

/// A tool to get the complete GraphQL schema in SDL format
#[derive(Debug, Clone)]
pub struct Introspect {
    schema: Arc<SchemaHandle>,
    pub tool: Tool,
}

/// Input for the introspect_schema tool.
#[derive(JsonSchema, Deserialize)]
pub struct Input {}

impl Introspect {
    pub fn new(schema: Arc<SchemaHandle>) -> Self {
        Self {
            schema,
            tool: Tool::new(
                INTROSPECT_TOOL_NAME,
                "Get the complete GraphQL schema in SDL format (for advanced users)",
                Arc::new(schema_from_type!(Input)),
            ),
        }
    }

    pub fn execute(&self) -> CallToolResult {
        CallToolResult::success(vec![Content::text(format!(
            "GraphQL Schema:\n\n{}",
            self.schema.sdl()
        ))])
    }
}
