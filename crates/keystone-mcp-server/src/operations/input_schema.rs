//! JSON Schema generation for tool arguments
//!
//! GraphQL input types are walked recursively. Recursion is bounded by a maximum depth so
//! that cyclic input graphs (`TodoWhereInput.AND: [TodoWhereInput!]`) terminate: an input
//! object reached beyond the bound is described as an opaque object.

use crate::custom_scalar_map::CustomScalarMap;
use apollo_compiler::ast::{InputValueDefinition, Type};
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::{Name, Node, Schema as GraphQLSchema};
use rmcp::model::JsonObject;
use schemars::{Schema as JSONSchema, json_schema};
use serde_json::{Map, Value};
use tracing::warn;

/// Compiles GraphQL input types into JSON Schemas
pub struct InputSchemaCompiler<'a> {
    /// The GraphQL schema with all type information
    schema: &'a GraphQLSchema,

    /// Schemas to use for custom scalars
    custom_scalar_map: Option<&'a CustomScalarMap>,

    /// Input objects nested deeper than this are left opaque
    max_depth: usize,
}

impl<'a> InputSchemaCompiler<'a> {
    pub fn new(
        schema: &'a GraphQLSchema,
        max_depth: usize,
        custom_scalar_map: Option<&'a CustomScalarMap>,
    ) -> Self {
        Self {
            schema,
            custom_scalar_map,
            max_depth,
        }
    }

    /// Compile a field's arguments into the input schema of a tool
    pub fn compile_arguments(&self, arguments: &[Node<InputValueDefinition>]) -> JsonObject {
        let (properties, required) = self.compile_values(arguments, 0, "Argument");

        let mut schema = Map::new();
        schema.insert("type".to_string(), "object".into());
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), required.into());
        }
        schema
    }

    /// Compile a single input type.
    ///
    /// Returns the schema and whether the type is non-null. The non-null wrapper is never
    /// expressed on the schema itself; the caller lists the value as required instead.
    pub fn compile_input_type(&self, ty: &Type, current_depth: usize) -> (JSONSchema, bool) {
        let schema = match ty {
            Type::List(inner) | Type::NonNullList(inner) => {
                let (items, _) = self.compile_input_type(inner, current_depth);
                json_schema!({
                    "type": "array",
                    "items": items,
                })
            }
            Type::Named(name) | Type::NonNullNamed(name) => self.compile_named(name, current_depth),
        };

        (schema, ty.is_non_null())
    }

    fn compile_named(&self, name: &Name, current_depth: usize) -> JSONSchema {
        match name.as_str() {
            "String" | "ID" => json_schema!({"type": "string"}),
            "Int" => json_schema!({"type": "integer"}),
            "Float" => json_schema!({"type": "number"}),
            "Boolean" => json_schema!({"type": "boolean"}),

            other => match self.schema.types.get(other) {
                Some(ExtendedType::Scalar(scalar)) => {
                    match self.custom_scalar_map.and_then(|map| map.get(other)) {
                        Some(custom) => custom.clone(),
                        None => with_description(
                            json_schema!({"type": "string"}),
                            scalar
                                .description
                                .as_ref()
                                .map(|description| format!("{other} scalar: {description}"))
                                .unwrap_or_else(|| format!("{other} scalar")),
                        ),
                    }
                }

                Some(ExtendedType::Enum(r#enum)) => json_schema!({
                    "type": "string",
                    "enum": r#enum.values.keys().map(Name::as_str).collect::<Vec<_>>(),
                }),

                Some(ExtendedType::InputObject(_)) if current_depth > self.max_depth => {
                    json_schema!({"type": "object"})
                }

                Some(ExtendedType::InputObject(input)) => {
                    let fields = input
                        .fields
                        .values()
                        .map(|field| field.node.clone())
                        .collect::<Vec<_>>();
                    let (properties, required) =
                        self.compile_values(&fields, current_depth + 1, "Field");

                    let mut schema = json_schema!({
                        "type": "object",
                        "properties": properties,
                    });
                    if !required.is_empty() {
                        schema.insert("required".to_string(), required.into());
                    }
                    match &input.description {
                        Some(description) => with_description(schema, description.to_string()),
                        None => schema,
                    }
                }

                _ => {
                    warn!(name = other, "Input type not found in schema");
                    json_schema!({})
                }
            },
        }
    }

    /// Compile argument or input field definitions into properties and required names
    fn compile_values(
        &self,
        values: &[Node<InputValueDefinition>],
        depth: usize,
        kind: &str,
    ) -> (Map<String, Value>, Vec<String>) {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for value in values.iter().filter(|value| !value.name.starts_with("__")) {
            let (schema, non_null) = self.compile_input_type(&value.ty, depth);
            let description = value
                .description
                .as_ref()
                .map(|description| description.to_string())
                .filter(|description| !description.trim().is_empty())
                .unwrap_or_else(|| format!("{kind} `{}`", value.name));

            properties.insert(
                value.name.to_string(),
                with_description(schema, description).into(),
            );
            if non_null && value.default_value.is_none() {
                required.push(value.name.to_string());
            }
        }

        (properties, required)
    }
}

/// Put a description first on a schema, keeping any description it already has after it
fn with_description(mut schema: JSONSchema, description: String) -> JSONSchema {
    let description = match schema.get("description").and_then(Value::as_str) {
        Some(existing) if existing != description => format!("{description}\n\n{existing}"),
        _ => description,
    };
    schema.insert("description".to_string(), description.into());
    schema
}
