//! Rebuild SDL from an introspection result
//!
//! The result of the introspection query is deserialized into the types below and printed
//! back into schema definition language, which `apollo-compiler` then parses and validates.

use crate::errors::IntrospectionError;
use serde::Deserialize;

/// Scalars every GraphQL schema provides; they are never printed
const BUILT_IN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// The `__schema` object of an introspection result
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSchema {
    pub query_type: Option<NamedTypeRef>,
    pub mutation_type: Option<NamedTypeRef>,
    pub subscription_type: Option<NamedTypeRef>,
    pub types: Vec<FullType>,
}

#[derive(Debug, Deserialize)]
pub struct NamedTypeRef {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullType {
    pub kind: TypeKind,
    pub name: Option<String>,
    pub description: Option<String>,
    pub fields: Option<Vec<Field>>,
    pub input_fields: Option<Vec<InputValue>>,
    pub interfaces: Option<Vec<TypeRef>>,
    pub enum_values: Option<Vec<EnumValue>>,
    pub possible_types: Option<Vec<TypeRef>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<InputValue>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValue {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub default_value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
}

/// A possibly wrapped reference to a named type
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub kind: TypeKind,
    pub name: Option<String>,
    pub of_type: Option<Box<TypeRef>>,
}

impl TypeRef {
    /// Print the reference in GraphQL type syntax, e.g. `[Todo!]!`
    pub fn to_graphql(&self) -> Result<String, IntrospectionError> {
        match self.kind {
            TypeKind::NonNull => Ok(format!("{}!", self.wrapped()?.to_graphql()?)),
            TypeKind::List => Ok(format!("[{}]", self.wrapped()?.to_graphql()?)),
            kind => self.name.clone().ok_or_else(|| {
                IntrospectionError::Malformed(format!("{kind:?} type reference has no name"))
            }),
        }
    }

    fn wrapped(&self) -> Result<&TypeRef, IntrospectionError> {
        self.of_type.as_deref().ok_or_else(|| {
            IntrospectionError::Malformed(format!("{:?} type reference has no ofType", self.kind))
        })
    }
}

impl IntrospectionSchema {
    /// Print the schema as SDL
    pub fn to_sdl(&self) -> Result<String, IntrospectionError> {
        let query_type = self.query_type.as_ref().ok_or_else(|| {
            IntrospectionError::Malformed("schema has no query type".to_string())
        })?;

        let mut roots = vec![format!("  query: {}", query_type.name)];
        if let Some(mutation_type) = &self.mutation_type {
            roots.push(format!("  mutation: {}", mutation_type.name));
        }
        if let Some(subscription_type) = &self.subscription_type {
            roots.push(format!("  subscription: {}", subscription_type.name));
        }

        let mut definitions = vec![format!("schema {{\n{}\n}}", roots.join("\n"))];
        for full_type in &self.types {
            if let Some(definition) = full_type.to_sdl()? {
                definitions.push(definition);
            }
        }

        Ok(definitions.join("\n\n") + "\n")
    }
}

impl FullType {
    fn to_sdl(&self) -> Result<Option<String>, IntrospectionError> {
        let name = self.name.as_deref().ok_or_else(|| {
            IntrospectionError::Malformed(format!("{:?} type has no name", self.kind))
        })?;
        if name.starts_with("__")
            || (self.kind == TypeKind::Scalar && BUILT_IN_SCALARS.contains(&name))
        {
            return Ok(None);
        }

        let body = match self.kind {
            TypeKind::Scalar => format!("scalar {name}"),
            TypeKind::Object | TypeKind::Interface => {
                let keyword = if self.kind == TypeKind::Object {
                    "type"
                } else {
                    "interface"
                };
                let interfaces = self
                    .interfaces
                    .iter()
                    .flatten()
                    .map(TypeRef::to_graphql)
                    .collect::<Result<Vec<_>, _>>()?;
                let implements = if interfaces.is_empty() {
                    String::new()
                } else {
                    format!(" implements {}", interfaces.join(" & "))
                };
                let fields = self
                    .fields
                    .iter()
                    .flatten()
                    .map(Field::to_sdl)
                    .collect::<Result<Vec<_>, _>>()?;
                format!("{keyword} {name}{implements} {{\n{}\n}}", fields.join("\n"))
            }
            TypeKind::Union => {
                let members = self
                    .possible_types
                    .iter()
                    .flatten()
                    .map(TypeRef::to_graphql)
                    .collect::<Result<Vec<_>, _>>()?;
                format!("union {name} = {}", members.join(" | "))
            }
            TypeKind::Enum => {
                let values = self
                    .enum_values
                    .iter()
                    .flatten()
                    .map(EnumValue::to_sdl)
                    .collect::<Result<Vec<_>, _>>()?;
                format!("enum {name} {{\n{}\n}}", values.join("\n"))
            }
            TypeKind::InputObject => {
                let fields = self
                    .input_fields
                    .iter()
                    .flatten()
                    .map(|field| Ok(format!("  {}", field.to_sdl("  ")?)))
                    .collect::<Result<Vec<_>, IntrospectionError>>()?;
                format!("input {name} {{\n{}\n}}", fields.join("\n"))
            }
            TypeKind::List | TypeKind::NonNull => {
                return Err(IntrospectionError::Malformed(format!(
                    "wrapper kind {:?} listed as a named type",
                    self.kind
                )));
            }
        };

        Ok(Some(format!(
            "{}{body}",
            description(self.description.as_deref(), "")?
        )))
    }
}

impl Field {
    fn to_sdl(&self) -> Result<String, IntrospectionError> {
        let arguments = if self.args.is_empty() {
            String::new()
        } else {
            let arguments = self
                .args
                .iter()
                .map(|arg| arg.to_sdl(""))
                .collect::<Result<Vec<_>, _>>()?;
            format!("({})", arguments.join(", "))
        };

        Ok(format!(
            "{}  {}{arguments}: {}{}",
            description(self.description.as_deref(), "  ")?,
            self.name,
            self.ty.to_graphql()?,
            deprecated(self.is_deprecated, self.deprecation_reason.as_deref())?,
        ))
    }
}

impl InputValue {
    /// Print as `name: Type = default`, preceded by an inline description when present
    fn to_sdl(&self, indent: &str) -> Result<String, IntrospectionError> {
        let description = match self.description.as_deref().filter(|d| !d.is_empty()) {
            Some(text) => format!("{}\n{indent}", serde_json::to_string(text)?),
            None => String::new(),
        };
        let default = self
            .default_value
            .as_deref()
            .map(|value| format!(" = {value}"))
            .unwrap_or_default();
        Ok(format!(
            "{description}{}: {}{default}",
            self.name,
            self.ty.to_graphql()?
        ))
    }
}

impl EnumValue {
    fn to_sdl(&self) -> Result<String, IntrospectionError> {
        Ok(format!(
            "{}  {}{}",
            description(self.description.as_deref(), "  ")?,
            self.name,
            deprecated(self.is_deprecated, self.deprecation_reason.as_deref())?,
        ))
    }
}

/// A description line, escaped as a single-line GraphQL string
fn description(text: Option<&str>, indent: &str) -> Result<String, IntrospectionError> {
    Ok(match text.filter(|text| !text.is_empty()) {
        Some(text) => format!("{indent}{}\n", serde_json::to_string(text)?),
        None => String::new(),
    })
}

fn deprecated(is_deprecated: bool, reason: Option<&str>) -> Result<String, IntrospectionError> {
    Ok(match (is_deprecated, reason) {
        (false, _) => String::new(),
        (true, Some(reason)) => format!(" @deprecated(reason: {})", serde_json::to_string(reason)?),
        (true, None) => " @deprecated".to_string(),
    })
}
