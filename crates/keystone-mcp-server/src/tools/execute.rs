use crate::errors::ToolError;
use crate::graphql::Executable;
use crate::operations::MutationMode;
use crate::schema_from_type;
use apollo_compiler::ast::{Definition, Document, OperationType};
use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// The name of the tool to execute an ad hoc GraphQL document
pub const EXECUTE_TOOL_NAME: &str = "execute_graphql";

#[derive(Debug, Clone)]
pub struct Execute {
    pub tool: Tool,
    mutation_mode: MutationMode,
}

/// Input for the execute_graphql tool.
#[derive(JsonSchema, Deserialize)]
pub struct Input {
    /// The GraphQL query or mutation to execute
    query: String,

    /// Variables for the query, as an object or a JSON string
    #[serde(default)]
    variables: Option<Value>,
}

impl Execute {
    pub fn new(mutation_mode: MutationMode) -> Self {
        let description = if mutation_mode.allows_all() {
            "Execute a custom GraphQL query or mutation (for advanced users). Use the `introspect_schema` tool to get the GraphQL schema first."
        } else {
            "Execute a custom GraphQL query (for advanced users). Mutations are not allowed. Use the `introspect_schema` tool to get the GraphQL schema first."
        };
        Self {
            mutation_mode,
            tool: Tool::new(
                EXECUTE_TOOL_NAME,
                description,
                Arc::new(schema_from_type!(Input)),
            ),
        }
    }

    fn input(input: &Value) -> Result<Input, ToolError> {
        serde_json::from_value::<Input>(input.clone())
            .map_err(|e| ToolError::InvalidInput(e.to_string()))
    }
}

impl Executable for Execute {
    fn document(&self, input: &Value) -> Result<String, ToolError> {
        let input = Self::input(input)?;
        let document = Document::parse(input.query.as_str(), "operation.graphql")
            .map_err(|e| ToolError::InvalidInput(e.errors.to_string()))?;

        let operations = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                Definition::OperationDefinition(operation) => Some(operation.operation_type),
                _ => None,
            })
            .collect::<Vec<_>>();
        if operations.is_empty() {
            return Err(ToolError::InvalidInput(
                "The document has no operation".to_string(),
            ));
        }
        if operations.contains(&OperationType::Subscription) {
            return Err(ToolError::NotAllowed(
                "Subscriptions are not supported".to_string(),
            ));
        }
        if operations.contains(&OperationType::Mutation) && !self.mutation_mode.allows_all() {
            return Err(ToolError::NotAllowed(
                "Mutations are not allowed".to_string(),
            ));
        }

        Ok(input.query)
    }

    fn variables(&self, input: &Value) -> Result<Value, ToolError> {
        match Self::input(input)?.variables {
            None | Some(Value::Null) => Ok(Value::Null),
            Some(Value::String(variables)) => match serde_json::from_str(&variables) {
                Ok(variables @ Value::Object(_)) => Ok(variables),
                _ => Err(ToolError::InvalidInput(
                    "variables must be a JSON object".to_string(),
                )),
            },
            Some(variables @ Value::Object(_)) => Ok(variables),
            Some(_) => Err(ToolError::InvalidInput(
                "variables must be a JSON object".to_string(),
            )),
        }
    }
}
