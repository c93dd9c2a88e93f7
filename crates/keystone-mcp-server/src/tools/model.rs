//! Hand-declared CRUD tools for a fixed list of models

use crate::errors::{ServerError, ToolError};
use crate::graphql::Executable;
use regex::Regex;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::{Arc, LazyLock};

pub const LIST_MODELS_TOOL_NAME: &str = "list_models";
pub const SEARCH_RECORDS_TOOL_NAME: &str = "search_records";

#[allow(clippy::unwrap_used)]
static MODEL_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new("^[A-Z][A-Za-z0-9]*$").unwrap());

/// A model exposed through CRUD tools
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// The GraphQL type name of the model, e.g. `Todo`
    pub name: String,

    /// The selection set returned by every operation on the model
    pub selection: String,

    /// Text fields matched by `search_records`
    #[serde(default)]
    pub search_fields: Vec<String>,
}

impl ModelConfig {
    fn new(name: &str, selection: &str, search_fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            selection: selection.to_string(),
            search_fields: search_fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// The models of the Todo app
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(
                "User",
                "id name email role { id name } tasks { id label }",
                &["name", "email"],
            ),
            Self::new(
                "Role",
                "id name canCreateTodos canManageAllTodos canSeeOtherPeople canEditOtherPeople canManagePeople canManageRoles canAccessDashboard",
                &["name"],
            ),
            Self::new(
                "Todo",
                "id label isComplete status priority dueDate assignedTo { id name }",
                &["label"],
            ),
            Self::new(
                "TodoImage",
                "id image { url } caption altText",
                &["caption", "altText"],
            ),
        ]
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if !MODEL_NAME.is_match(&self.name) {
            return Err(ServerError::ModelConfig(format!(
                "model name `{}` must be a capitalized GraphQL type name",
                self.name
            )));
        }
        if self.selection.trim().is_empty() {
            return Err(ServerError::ModelConfig(format!(
                "model `{}` has an empty selection",
                self.name
            )));
        }
        Ok(())
    }

    /// The suffix of tool names, e.g. `todoimage`
    pub fn tool_suffix(&self) -> String {
        self.name.to_lowercase()
    }

    /// The root query field listing the model, e.g. `todoImages`
    pub fn list_field(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => format!("{}{}s", first.to_lowercase(), chars.as_str()),
            None => String::new(),
        }
    }

    /// A `where` filter matching `query` case-insensitively against the searchable fields
    pub fn search_filter(&self, query: &str, filters: Map<String, Value>) -> Map<String, Value> {
        let mut filter = filters;
        if query.is_empty() {
            return filter;
        }

        let condition = json!({"contains": query, "mode": "insensitive"});
        match self.search_fields.as_slice() {
            [] => {}
            [field] => {
                filter.insert(field.clone(), condition);
            }
            fields => {
                let any = fields
                    .iter()
                    .map(|field| {
                        let mut single = Map::new();
                        single.insert(field.clone(), condition.clone());
                        Value::Object(single)
                    })
                    .collect();
                filter.insert("OR".to_string(), Value::Array(any));
            }
        }
        filter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelAction {
    List,
    Create,
    Update,
    Delete,
}

impl ModelAction {
    pub fn is_mutation(self) -> bool {
        !matches!(self, ModelAction::List)
    }
}

/// One CRUD operation on one model
#[derive(Debug, Clone)]
pub struct ModelTool {
    pub model: ModelConfig,
    pub action: ModelAction,
    pub tool: Tool,
}

impl ModelTool {
    pub fn new(model: ModelConfig, action: ModelAction) -> Self {
        let suffix = model.tool_suffix();
        let name = &model.name;
        let (tool_name, description, input_schema) = match action {
            ModelAction::List => (
                format!("list_{suffix}s"),
                format!("List all {name} records"),
                json!({
                    "type": "object",
                    "properties": {
                        "where": {"type": "object", "description": "Filter conditions"},
                        "take": {"type": "integer", "description": "Number of records to return"},
                        "skip": {"type": "integer", "description": "Number of records to skip"},
                    },
                }),
            ),
            ModelAction::Create => (
                format!("create_{suffix}"),
                format!("Create a new {name} record"),
                json!({
                    "type": "object",
                    "properties": {
                        "data": {"type": "object", "description": format!("{name} data to create")},
                    },
                    "required": ["data"],
                }),
            ),
            ModelAction::Update => (
                format!("update_{suffix}"),
                format!("Update an existing {name} record"),
                json!({
                    "type": "object",
                    "properties": {
                        "where": where_unique("ID of the record to update"),
                        "data": {"type": "object", "description": "Fields to update"},
                    },
                    "required": ["where", "data"],
                }),
            ),
            ModelAction::Delete => (
                format!("delete_{suffix}"),
                format!("Delete a {name} record"),
                json!({
                    "type": "object",
                    "properties": {
                        "where": where_unique("ID of the record to delete"),
                    },
                    "required": ["where"],
                }),
            ),
        };

        Self {
            tool: Tool::new(tool_name, description, Arc::new(into_object(input_schema))),
            model,
            action,
        }
    }
}

fn where_unique(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {"id": {"type": "string"}},
        "required": ["id"],
        "description": description,
    })
}

pub(super) fn into_object(value: Value) -> JsonObject {
    match value {
        Value::Object(object) => object,
        _ => JsonObject::new(),
    }
}

fn object_argument(input: &Value, name: &str) -> Result<Value, ToolError> {
    match input.get(name) {
        Some(value @ Value::Object(_)) => Ok(value.clone()),
        Some(_) => Err(ToolError::InvalidInput(format!("`{name}` must be an object"))),
        None => Err(ToolError::InvalidInput(format!("`{name}` is required"))),
    }
}

impl Executable for ModelTool {
    fn document(&self, _input: &Value) -> Result<String, ToolError> {
        let name = &self.model.name;
        let selection = &self.model.selection;
        Ok(match self.action {
            ModelAction::List => {
                let list = self.model.list_field();
                format!(
                    "query List{name}s($where: {name}WhereInput!, $take: Int, $skip: Int!) {{\n  {list}(where: $where, take: $take, skip: $skip) {{\n    {selection}\n  }}\n  {list}Count(where: $where)\n}}"
                )
            }
            ModelAction::Create => format!(
                "mutation Create{name}($data: {name}CreateInput!) {{\n  create{name}(data: $data) {{\n    {selection}\n  }}\n}}"
            ),
            ModelAction::Update => format!(
                "mutation Update{name}($where: {name}WhereUniqueInput!, $data: {name}UpdateInput!) {{\n  update{name}(where: $where, data: $data) {{\n    {selection}\n  }}\n}}"
            ),
            ModelAction::Delete => format!(
                "mutation Delete{name}($where: {name}WhereUniqueInput!) {{\n  delete{name}(where: $where) {{\n    id\n  }}\n}}"
            ),
        })
    }

    fn variables(&self, input: &Value) -> Result<Value, ToolError> {
        Ok(match self.action {
            ModelAction::List => {
                let filter = match input.get("where") {
                    None | Some(Value::Null) => json!({}),
                    Some(_) => object_argument(input, "where")?,
                };
                let take = input.get("take").cloned().unwrap_or(Value::Null);
                let skip = match input.get("skip") {
                    None | Some(Value::Null) => json!(0),
                    Some(skip) => skip.clone(),
                };
                json!({"where": filter, "take": take, "skip": skip})
            }
            ModelAction::Create => json!({"data": object_argument(input, "data")?}),
            ModelAction::Update => json!({
                "where": object_argument(input, "where")?,
                "data": object_argument(input, "data")?,
            }),
            ModelAction::Delete => json!({"where": object_argument(input, "where")?}),
        })
    }
}

/// Lists the configured models and how to operate on them
#[derive(Debug, Clone)]
pub struct ListModels {
    text: String,
    pub tool: Tool,
}

/// Input for the list_models tool.
#[derive(JsonSchema, Deserialize)]
pub struct ListModelsInput {}

impl ListModels {
    pub fn new(models: &[ModelConfig], allow_mutations: bool) -> Self {
        let names = models
            .iter()
            .map(|model| format!("- {}", model.name))
            .collect::<Vec<_>>()
            .join("\n");
        let operations = if allow_mutations {
            "list_<model>, create_<model>, update_<model>, delete_<model>"
        } else {
            "list_<model>"
        };
        Self {
            text: format!(
                "Available models:\n{names}\n\nYou can use {operations} operations for each model."
            ),
            tool: Tool::new(
                LIST_MODELS_TOOL_NAME,
                "List all available models in the GraphQL API",
                Arc::new(crate::schema_from_type!(ListModelsInput)),
            ),
        }
    }

    pub fn execute(&self) -> CallToolResult {
        CallToolResult::success(vec![Content::text(self.text.clone())])
    }
}

/// Case-insensitive text search over one model
#[derive(Debug, Clone)]
pub struct SearchRecords {
    models: Vec<ModelConfig>,
    pub tool: Tool,
}

/// Input for the search_records tool.
#[derive(Deserialize)]
pub struct SearchInput {
    model: String,
    query: String,
    #[serde(default)]
    filters: Option<Map<String, Value>>,
}

impl SearchRecords {
    pub fn new(models: Vec<ModelConfig>) -> Self {
        let names = models.iter().map(|model| model.name.as_str()).collect::<Vec<_>>();
        let input_schema = json!({
            "type": "object",
            "properties": {
                "model": {"type": "string", "enum": names, "description": "Model to search"},
                "query": {"type": "string", "description": "Search query (searches text fields)"},
                "filters": {"type": "object", "description": "Additional filters"},
            },
            "required": ["model", "query"],
        });
        Self {
            tool: Tool::new(
                SEARCH_RECORDS_TOOL_NAME,
                "Search across models with advanced filtering",
                Arc::new(into_object(input_schema)),
            ),
            models,
        }
    }

    fn input(&self, input: &Value) -> Result<(&ModelConfig, SearchInput), ToolError> {
        let input = serde_json::from_value::<SearchInput>(input.clone())
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let model = self
            .models
            .iter()
            .find(|model| model.name == input.model)
            .ok_or_else(|| ToolError::InvalidInput(format!("Unknown model {}", input.model)))?;
        Ok((model, input))
    }
}

impl Executable for SearchRecords {
    fn document(&self, input: &Value) -> Result<String, ToolError> {
        let (model, _) = self.input(input)?;
        let name = &model.name;
        let list = model.list_field();
        let selection = &model.selection;
        Ok(format!(
            "query Search{name}($where: {name}WhereInput!) {{\n  {list}(where: $where) {{\n    {selection}\n  }}\n  {list}Count(where: $where)\n}}"
        ))
    }

    fn variables(&self, input: &Value) -> Result<Value, ToolError> {
        let (model, input) = self.input(input)?;
        let filter = model.search_filter(&input.query, input.filters.unwrap_or_default());
        Ok(json!({"where": filter}))
    }
}
