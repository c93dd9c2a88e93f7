use crate::errors::ServerError;
use schemars::Schema;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Keywords accepted in a custom scalar schema
const KNOWN_KEYWORDS: &[&str] = &[
    "$schema",
    "additionalProperties",
    "allOf",
    "anyOf",
    "const",
    "default",
    "description",
    "enum",
    "examples",
    "exclusiveMaximum",
    "exclusiveMinimum",
    "format",
    "items",
    "maxItems",
    "maxLength",
    "maximum",
    "minItems",
    "minLength",
    "minimum",
    "multipleOf",
    "not",
    "oneOf",
    "pattern",
    "properties",
    "required",
    "title",
    "type",
    "uniqueItems",
];

/// JSON Schemas to use for custom GraphQL scalars instead of the plain string mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomScalarMap(HashMap<String, Schema>);

impl CustomScalarMap {
    pub fn get(&self, key: &str) -> Option<&Schema> {
        self.0.get(key)
    }
}

impl FromStr for CustomScalarMap {
    type Err = ServerError;

    fn from_str(custom_scalar_file: &str) -> Result<Self, Self::Err> {
        let parsed: serde_json::Map<String, Value> =
            serde_json::from_str(custom_scalar_file).map_err(ServerError::CustomScalarConfig)?;

        parsed
            .into_iter()
            .map(|(key, value)| {
                if has_invalid_schema(&value) {
                    return Err(ServerError::CustomScalarJsonSchema(value));
                }
                Schema::try_from(value.clone())
                    .map(|schema| (key, schema))
                    .map_err(|_| ServerError::CustomScalarJsonSchema(value))
            })
            .collect::<Result<_, _>>()
            .map(CustomScalarMap)
    }
}

impl TryFrom<&Path> for CustomScalarMap {
    type Error = ServerError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        tracing::debug!(custom_scalars_config=?path, "Loading custom_scalars_config");
        let custom_scalar_file = std::fs::read_to_string(path)?;
        CustomScalarMap::from_str(&custom_scalar_file)
    }
}

// Unknown keywords anywhere in the schema make it invalid
fn has_invalid_schema(schema: &Value) -> bool {
    match schema {
        Value::Object(object) => object.iter().any(|(keyword, value)| {
            if !KNOWN_KEYWORDS.contains(&keyword.as_str()) {
                return true;
            }
            match (keyword.as_str(), value) {
                ("properties", Value::Object(properties)) => {
                    properties.values().any(has_invalid_schema)
                }
                ("items" | "additionalProperties" | "not", nested) => has_invalid_schema(nested),
                ("allOf" | "anyOf" | "oneOf", Value::Array(schemas)) => {
                    schemas.iter().any(has_invalid_schema)
                }
                _ => false,
            }
        }),
        Value::Bool(_) => false,
        _ => true,
    }
}
