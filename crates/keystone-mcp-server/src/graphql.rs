//! Execute GraphQL documents from an MCP tool

use crate::errors::ToolError;
use crate::transport::{AuthenticatedTransport, Response};
use rmcp::model::{CallToolResult, Content};
use serde_json::Value;
use tracing::debug;

/// Able to be executed as a GraphQL document
pub trait Executable {
    /// Get the document to execute
    fn document(&self, input: &Value) -> Result<String, ToolError>;

    /// Get the variables to execute the document with
    fn variables(&self, input: &Value) -> Result<Value, ToolError>;

    /// Execute through the session's transport
    async fn execute(
        &self,
        transport: &AuthenticatedTransport,
        input: &Value,
    ) -> Result<CallToolResult, ToolError> {
        let document = self.document(input)?;
        let variables = self.variables(input)?;
        debug!(%variables, "Executing document:\n{document}");

        let response = transport.execute(&document, variables).await?;
        to_result(&response)
    }
}

/// Render a response as pretty-printed JSON text.
///
/// The result is an error only when the response carries errors and no data.
pub fn to_result(response: &Response) -> Result<CallToolResult, ToolError> {
    let text = serde_json::to_string_pretty(&response.body)?;
    let content = vec![Content::text(text)];
    Ok(if response.errors().is_some() && !response.has_data() {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    fn response(body: Value) -> Response {
        Response {
            status: StatusCode::OK,
            body,
        }
    }

    #[test]
    fn data_is_pretty_printed() {
        let result = to_result(&response(json!({"data": {"todos": [{"id": "1"}]}}))).unwrap();

        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.content.len(), 1);
        insta::assert_snapshot!(&result.content[0].as_text().unwrap().text, @r#"
        {
          "data": {
            "todos": [
              {
                "id": "1"
              }
            ]
          }
        }
        "#);
    }

    #[test]
    fn partial_data_is_not_an_error() {
        let result = to_result(&response(json!({
            "data": {"todos": null},
            "errors": [{"message": "Access denied", "path": ["todos"]}]
        })))
        .unwrap();

        assert_eq!(result.is_error, Some(false));
    }

    #[test]
    fn errors_without_data_are_an_error() {
        let result = to_result(&response(json!({
            "data": null,
            "errors": [{"message": "Access denied"}]
        })))
        .unwrap();

        assert_eq!(result.is_error, Some(true));
    }
}
