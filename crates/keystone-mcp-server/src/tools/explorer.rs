use crate::schema_from_type;
use rmcp::model::{CallToolResult, Content, Tool};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use url::Url;

pub const EXPLORER_TOOL_NAME: &str = "open_apollo_studio";

/// Points the caller at the GraphQL explorer served by the endpoint
#[derive(Debug, Clone)]
pub struct Explorer {
    endpoint: Url,
    pub tool: Tool,
}

/// Input for the open_apollo_studio tool.
#[derive(JsonSchema, Deserialize)]
pub struct Input {}

impl Explorer {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            tool: Tool::new(
                EXPLORER_TOOL_NAME,
                "Get the URL to open Apollo Studio Explorer for this GraphQL API",
                Arc::new(schema_from_type!(Input)),
            ),
        }
    }

    pub fn execute(&self) -> CallToolResult {
        debug!(url = %self.endpoint, "Returning explorer URL");
        CallToolResult::success(vec![Content::text(format!(
            "Open Apollo Studio Explorer at: {}\n\nThis provides a full GraphQL IDE with:\n- Schema documentation\n- Query builder\n- Variable editor\n- Response viewer",
            self.endpoint
        ))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explorer_text() {
        let explorer = Explorer::new(Url::parse("http://localhost:3003/api/graphql").unwrap());

        insta::assert_snapshot!(&explorer.execute().content[0].as_text().unwrap().text, @r"
        Open Apollo Studio Explorer at: http://localhost:3003/api/graphql

        This provides a full GraphQL IDE with:
        - Schema documentation
        - Query builder
        - Variable editor
        - Response viewer
        ");
    }
}
