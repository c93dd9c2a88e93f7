//! The tool registry
//!
//! A registry is plain data built from one [`SchemaHandle`]. It maps tool names to
//! descriptors in the order tools were discovered: schema field order in schema mode,
//! model declaration order in model mode.

mod execute;
mod explorer;
mod introspect;
mod model;
mod root_field;

use crate::custom_scalar_map::CustomScalarMap;
use crate::errors::{ServerError, ToolError};
use crate::graphql::Executable;
use crate::introspection::SchemaHandle;
use crate::operations::{DEFAULT_MAX_DEPTH, MutationMode};
use crate::transport::AuthenticatedTransport;
use apollo_compiler::ast::OperationType;
use indexmap::IndexMap;
use rmcp::model::{CallToolResult, JsonObject, Tool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

pub use execute::{EXECUTE_TOOL_NAME, Execute};
pub use explorer::{EXPLORER_TOOL_NAME, Explorer};
pub use introspect::{INTROSPECT_TOOL_NAME, Introspect};
pub use model::{
    LIST_MODELS_TOOL_NAME, ListModels, ModelAction, ModelConfig, ModelTool,
    SEARCH_RECORDS_TOOL_NAME, SearchRecords,
};
pub use root_field::RootFieldTool;

/// How tools are derived
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegistryMode {
    /// One tool per root field of the schema
    Schema,
    /// CRUD tools for an explicit list of models
    #[default]
    Model,
}

/// Tool configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ToolOptions {
    /// How tools are derived from the schema
    pub mode: RegistryMode,

    /// Recursion bound for argument schemas and selection sets
    pub max_depth: usize,

    /// Which mutations are exposed
    pub mutation_mode: MutationMode,

    /// Models exposed in model mode
    pub models: Vec<ModelConfig>,

    /// Expose the `execute_graphql` tool
    pub execute: bool,

    /// Expose the `introspect_schema` tool
    pub introspect: bool,

    /// Expose the `open_apollo_studio` tool
    pub explorer: bool,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            mode: RegistryMode::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            mutation_mode: MutationMode::default(),
            models: ModelConfig::defaults(),
            execute: true,
            introspect: true,
            explorer: true,
        }
    }
}

/// Where a tool comes from, and what it needs to run
#[derive(Debug, Clone)]
pub enum ToolOrigin {
    RootField(Box<RootFieldTool>),
    Model(Box<ModelTool>),
    ListModels(ListModels),
    SearchRecords(SearchRecords),
    Execute(Execute),
    Introspect(Introspect),
    Explorer(Explorer),
}

impl ToolOrigin {
    fn tool(&self) -> &Tool {
        match self {
            ToolOrigin::RootField(root_field) => &root_field.tool,
            ToolOrigin::Model(model) => &model.tool,
            ToolOrigin::ListModels(list_models) => &list_models.tool,
            ToolOrigin::SearchRecords(search) => &search.tool,
            ToolOrigin::Execute(execute) => &execute.tool,
            ToolOrigin::Introspect(introspect) => &introspect.tool,
            ToolOrigin::Explorer(explorer) => &explorer.tool,
        }
    }

    /// Run the tool with the given arguments through the session's transport
    pub async fn invoke(
        &self,
        input: &Value,
        transport: &AuthenticatedTransport,
    ) -> Result<CallToolResult, ToolError> {
        match self {
            ToolOrigin::RootField(root_field) => root_field.execute(transport, input).await,
            ToolOrigin::Model(model) => model.execute(transport, input).await,
            ToolOrigin::SearchRecords(search) => search.execute(transport, input).await,
            ToolOrigin::Execute(execute) => execute.execute(transport, input).await,
            ToolOrigin::ListModels(list_models) => Ok(list_models.execute()),
            ToolOrigin::Introspect(introspect) => Ok(introspect.execute()),
            ToolOrigin::Explorer(explorer) => Ok(explorer.execute()),
        }
    }
}

/// One exposed tool
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Arc<JsonObject>,
    pub origin: ToolOrigin,
}

impl From<ToolOrigin> for ToolDescriptor {
    fn from(origin: ToolOrigin) -> Self {
        let tool = origin.tool();
        Self {
            name: tool.name.to_string(),
            description: tool
                .description
                .as_deref()
                .unwrap_or_default()
                .to_string(),
            input_schema: Arc::clone(&tool.input_schema),
            origin,
        }
    }
}

impl ToolDescriptor {
    pub fn tool(&self) -> Tool {
        Tool::new(
            self.name.clone(),
            self.description.clone(),
            Arc::clone(&self.input_schema),
        )
    }
}

/// Tools by name, in discovery order
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tools: IndexMap<String, ToolDescriptor>,
}

impl Registry {
    /// Build the registry for a schema
    pub fn build(
        schema: Arc<SchemaHandle>,
        options: &ToolOptions,
        endpoint: &Url,
        custom_scalar_map: Option<&CustomScalarMap>,
    ) -> Result<Self, ServerError> {
        let mut registry = Self::default();

        match options.mode {
            RegistryMode::Schema => {
                let mut operations = vec![OperationType::Query];
                if options.mutation_mode.allows_all() {
                    operations.push(OperationType::Mutation);
                }
                for operation in operations {
                    let Some(root) = schema.root_type(operation) else {
                        continue;
                    };
                    for field in root.fields.values() {
                        if field.name.starts_with("__") {
                            continue;
                        }
                        if let Some(tool) = RootFieldTool::new(
                            Arc::clone(&schema),
                            operation,
                            field,
                            options.max_depth,
                            custom_scalar_map,
                        ) {
                            registry.insert(ToolOrigin::RootField(Box::new(tool)));
                        }
                    }
                }
            }
            RegistryMode::Model => {
                for model in &options.models {
                    model.validate()?;
                }
                for model in &options.models {
                    for action in [
                        ModelAction::List,
                        ModelAction::Create,
                        ModelAction::Update,
                        ModelAction::Delete,
                    ] {
                        if action.is_mutation() && !options.mutation_mode.allows_explicit() {
                            continue;
                        }
                        registry.insert(ToolOrigin::Model(Box::new(ModelTool::new(
                            model.clone(),
                            action,
                        ))));
                    }
                }
                registry.insert(ToolOrigin::ListModels(ListModels::new(
                    &options.models,
                    options.mutation_mode.allows_explicit(),
                )));
                registry.insert(ToolOrigin::SearchRecords(SearchRecords::new(
                    options.models.clone(),
                )));
            }
        }

        if options.introspect {
            registry.insert(ToolOrigin::Introspect(Introspect::new(Arc::clone(&schema))));
        }
        if options.execute {
            registry.insert(ToolOrigin::Execute(Execute::new(options.mutation_mode)));
        }
        if options.explorer {
            registry.insert(ToolOrigin::Explorer(Explorer::new(endpoint.clone())));
        }

        debug!(tools = ?registry.names(), "Built tool registry");
        Ok(registry)
    }

    fn insert(&mut self, origin: ToolOrigin) {
        let descriptor = ToolDescriptor::from(origin);
        if self.tools.contains_key(&descriptor.name) {
            warn!(name = %descriptor.name, "Skipping tool with a duplicate name");
            return;
        }
        self.tools.insert(descriptor.name.clone(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The MCP tools, in registry order
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.values().map(ToolDescriptor::tool).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<SchemaHandle> {
        Arc::new(SchemaHandle::parse(include_str!("testdata/todo.graphql")).unwrap())
    }

    fn endpoint() -> Url {
        Url::parse("http://localhost:3003/api/graphql").unwrap()
    }

    fn build(options: ToolOptions) -> Registry {
        Registry::build(schema(), &options, &endpoint(), None).unwrap()
    }

    #[test]
    fn model_mode_by_default() {
        let registry = build(ToolOptions::default());

        assert_eq!(
            registry.names(),
            vec![
                "list_users",
                "create_user",
                "update_user",
                "delete_user",
                "list_roles",
                "create_role",
                "update_role",
                "delete_role",
                "list_todos",
                "create_todo",
                "update_todo",
                "delete_todo",
                "list_todoimages",
                "create_todoimage",
                "update_todoimage",
                "delete_todoimage",
                "list_models",
                "search_records",
                "introspect_schema",
                "execute_graphql",
                "open_apollo_studio",
            ]
        );
    }

    #[test]
    fn model_mode_without_mutations() {
        let registry = build(ToolOptions {
            mutation_mode: MutationMode::None,
            execute: false,
            introspect: false,
            explorer: false,
            ..Default::default()
        });

        assert_eq!(
            registry.names(),
            vec![
                "list_users",
                "list_roles",
                "list_todos",
                "list_todoimages",
                "list_models",
                "search_records",
            ]
        );
    }

    #[test]
    fn invalid_models_fail() {
        let result = Registry::build(
            schema(),
            &ToolOptions {
                models: vec![ModelConfig {
                    name: "todo".to_string(),
                    selection: "id".to_string(),
                    search_fields: Vec::new(),
                }],
                ..Default::default()
            },
            &endpoint(),
            None,
        );

        assert!(matches!(result, Err(ServerError::ModelConfig(_))));
    }

    #[test]
    fn schema_mode_follows_field_order() {
        let registry = build(ToolOptions {
            mode: RegistryMode::Schema,
            execute: false,
            introspect: false,
            explorer: false,
            ..Default::default()
        });

        // `authenticatedItem` returns a union
        assert_eq!(
            registry.names(),
            vec![
                "todos",
                "todo",
                "todosCount",
                "users",
                "roles",
                "redirectToInit",
                "node",
            ]
        );
    }

    #[test]
    fn schema_mode_with_all_mutations() {
        let registry = build(ToolOptions {
            mode: RegistryMode::Schema,
            mutation_mode: MutationMode::All,
            ..Default::default()
        });

        let names = registry.names();
        assert!(names.contains(&"createTodo"));
        assert!(names.contains(&"deleteTodo"));
        assert!(names.contains(&"endSession"));
        assert_eq!(names.last(), Some(&"open_apollo_studio"));
    }

    #[test]
    fn descriptors_mirror_tools() {
        let registry = build(ToolOptions::default());

        let descriptor = registry.get("list_todos").unwrap();
        assert_eq!(descriptor.description, "List all Todo records");
        assert!(matches!(descriptor.origin, ToolOrigin::Model(_)));
        assert!(!descriptor.description.is_empty());

        let tools = registry.list_tools();
        assert_eq!(tools.len(), registry.len());
        assert_eq!(tools[0].name, "list_users");
        assert!(tools.iter().all(|tool| tool.input_schema.get("type") == Some(&"object".into())));
    }
}
