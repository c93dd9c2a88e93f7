//! Tools generated from the root fields of the schema

use crate::custom_scalar_map::CustomScalarMap;
use crate::errors::ToolError;
use crate::graphql::Executable;
use crate::introspection::SchemaHandle;
use crate::operations::{InputSchemaCompiler, build_selection, synthesize};
use apollo_compiler::Name;
use apollo_compiler::ast::OperationType;
use apollo_compiler::schema::{ExtendedType, FieldDefinition};
use rmcp::model::Tool;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Invokes one query or mutation root field
#[derive(Debug, Clone)]
pub struct RootFieldTool {
    schema: Arc<SchemaHandle>,
    operation: OperationType,
    field: Name,
    max_depth: usize,
    pub tool: Tool,
}

impl RootFieldTool {
    /// Create the tool for a root field, or `None` when the field cannot be selected
    pub fn new(
        schema: Arc<SchemaHandle>,
        operation: OperationType,
        field: &FieldDefinition,
        max_depth: usize,
        custom_scalar_map: Option<&CustomScalarMap>,
    ) -> Option<Self> {
        let return_type = field.ty.inner_named_type();
        match schema.schema().types.get(return_type) {
            Some(ExtendedType::Object(_) | ExtendedType::Interface(_)) => {
                if build_selection(schema.schema(), return_type, max_depth, 0).is_empty() {
                    debug!(field = %field.name, "Skipping field with nothing selectable");
                    return None;
                }
            }
            Some(ExtendedType::Union(_)) => {
                debug!(field = %field.name, "Skipping union field");
                return None;
            }
            _ => {}
        }

        let input_schema = InputSchemaCompiler::new(schema.schema(), max_depth, custom_scalar_map)
            .compile_arguments(&field.arguments);
        let description = field
            .description
            .as_ref()
            .map(|description| description.to_string())
            .filter(|description| !description.trim().is_empty())
            .unwrap_or_else(|| {
                let kind = match operation {
                    OperationType::Mutation => "Mutation",
                    _ => "Query",
                };
                format!("{kind} field `{}` returning `{}`", field.name, field.ty)
            });

        Some(Self {
            tool: Tool::new(field.name.to_string(), description, Arc::new(input_schema)),
            schema,
            operation,
            field: field.name.clone(),
            max_depth,
        })
    }

    fn definition(&self) -> Result<&FieldDefinition, ToolError> {
        let field: &FieldDefinition = self
            .schema
            .root_type(self.operation)
            .and_then(|root| root.fields.get(&self.field))
            .ok_or_else(|| ToolError::NotFound(self.field.to_string()))?;
        Ok(field)
    }
}

impl Executable for RootFieldTool {
    fn document(&self, _input: &Value) -> Result<String, ToolError> {
        let field = self.definition()?;
        let selection = build_selection(
            self.schema.schema(),
            field.ty.inner_named_type(),
            self.max_depth,
            0,
        );
        Ok(synthesize(self.operation, &field.name, &field.arguments, selection).to_string())
    }

    /// Every declared argument present in the input, in declaration order
    fn variables(&self, input: &Value) -> Result<Value, ToolError> {
        let field = self.definition()?;
        let input = match input {
            Value::Object(input) => input,
            Value::Null => return Ok(Value::Object(Map::new())),
            _ => {
                return Err(ToolError::InvalidInput(
                    "arguments must be an object".to_string(),
                ));
            }
        };

        Ok(Value::Object(
            field
                .arguments
                .iter()
                .filter_map(|argument| {
                    input
                        .get(argument.name.as_str())
                        .map(|value| (argument.name.to_string(), value.clone()))
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::DEFAULT_MAX_DEPTH;
    use serde_json::json;

    fn schema() -> Arc<SchemaHandle> {
        Arc::new(SchemaHandle::parse(include_str!("../testdata/todo.graphql")).unwrap())
    }

    fn tool(schema: &Arc<SchemaHandle>, operation: OperationType, name: &str) -> Option<RootFieldTool> {
        let field = schema.root_type(operation).unwrap().fields[name].clone();
        RootFieldTool::new(
            Arc::clone(schema),
            operation,
            &field,
            DEFAULT_MAX_DEPTH,
            None,
        )
    }

    #[test]
    fn todos_tool() {
        let schema = schema();
        let todos = tool(&schema, OperationType::Query, "todos").unwrap();

        assert_eq!(todos.tool.name, "todos");
        assert_eq!(
            todos.tool.description.as_deref(),
            Some("Search for the Todo items which match the where clause.")
        );
        let input = Value::Object(todos.tool.input_schema.as_ref().clone());
        assert_eq!(input["properties"]["where"]["type"], "object");
        assert_eq!(input["properties"]["take"]["type"], "integer");
        assert!(input.get("required").is_none());

        let document = todos.document(&json!({})).unwrap();
        assert!(document.starts_with(
            "query Todos($where: TodoWhereInput, $take: Int) {\n  todos(where: $where, take: $take) {\n    id\n    label\n"
        ));
        assert!(document.contains("\n    assignedTo { id name "));
    }

    #[test]
    fn leaf_field_tool() {
        let schema = schema();
        let redirect = tool(&schema, OperationType::Query, "redirectToInit").unwrap();

        assert_eq!(
            redirect.tool.description.as_deref(),
            Some("Query field `redirectToInit` returning `Boolean`")
        );
        assert_eq!(
            redirect.document(&Value::Null).unwrap(),
            "query RedirectToInit {\n  redirectToInit\n}"
        );
    }

    #[test]
    fn union_fields_are_skipped() {
        let schema = schema();

        assert!(tool(&schema, OperationType::Query, "authenticatedItem").is_none());
    }

    #[test]
    fn variables_keep_declared_arguments() {
        let schema = schema();
        let todos = tool(&schema, OperationType::Query, "todos").unwrap();

        let variables = todos
            .variables(&json!({"take": 2, "orderBy": {"label": "asc"}}))
            .unwrap();

        assert_eq!(variables, json!({"take": 2}));
        assert!(matches!(
            todos.variables(&json!([1])),
            Err(ToolError::InvalidInput(_))
        ));
    }

    #[test]
    fn mutation_tool() {
        let schema = schema();
        let create = tool(&schema, OperationType::Mutation, "createTodo").unwrap();

        let input = Value::Object(create.tool.input_schema.as_ref().clone());
        assert_eq!(input["required"], json!(["data"]));
        assert!(
            create
                .document(&json!({}))
                .unwrap()
                .starts_with("mutation CreateTodo($data: TodoCreateInput!) {\n  createTodo(data: $data) {\n")
        );
    }
}
