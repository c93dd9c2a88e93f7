//! Fetching the GraphQL schema from the live endpoint

mod client_schema;
mod query;

use crate::errors::IntrospectionError;
use crate::transport::AuthenticatedTransport;
use apollo_compiler::ast::OperationType;
use apollo_compiler::schema::ObjectType;
use apollo_compiler::validation::Valid;
use apollo_compiler::{Node, Schema};
use client_schema::IntrospectionSchema;
use serde_json::Value;
use tracing::{debug, info};

pub use query::INTROSPECTION_QUERY;

/// An introspected, validated schema.
///
/// Built once per introspection and never mutated; share it behind an `Arc`.
#[derive(Debug)]
pub struct SchemaHandle {
    schema: Valid<Schema>,
}

impl SchemaHandle {
    /// Parse and validate a schema from SDL
    pub fn parse(sdl: impl Into<String>) -> Result<Self, IntrospectionError> {
        Schema::parse_and_validate(sdl, "introspection.graphql")
            .map(|schema| Self { schema })
            .map_err(|errors| IntrospectionError::InvalidSchema(Box::new(errors)))
    }

    /// Rebuild a schema from the `__schema` object of an introspection result
    pub fn from_introspection(schema: Value) -> Result<Self, IntrospectionError> {
        let introspection: IntrospectionSchema = serde_json::from_value(schema)?;
        Self::parse(introspection.to_sdl()?)
    }

    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }

    /// The root object type for an operation, if the schema declares one
    pub fn root_type(&self, operation: OperationType) -> Option<&Node<ObjectType>> {
        self.schema
            .root_operation(operation)
            .and_then(|name| self.schema.get_object(name))
    }

    pub fn query_type(&self) -> Option<&Node<ObjectType>> {
        self.root_type(OperationType::Query)
    }

    pub fn mutation_type(&self) -> Option<&Node<ObjectType>> {
        self.root_type(OperationType::Mutation)
    }

    /// Print the schema as SDL
    pub fn sdl(&self) -> String {
        self.schema.to_string()
    }
}

/// Run the introspection query through the transport and rebuild the schema.
///
/// No retries are attempted.
pub async fn introspect(
    transport: &AuthenticatedTransport,
) -> Result<SchemaHandle, IntrospectionError> {
    info!(endpoint = %transport.endpoint(), "Introspecting GraphQL schema");
    let response = transport.execute(INTROSPECTION_QUERY, Value::Null).await?;

    if !response.status.is_success() {
        return Err(IntrospectionError::Status(response.status));
    }
    if let Some(error) = response.execution_error() {
        return Err(IntrospectionError::GraphQL(error.to_string()));
    }

    let schema = response
        .body
        .get("data")
        .and_then(|data| data.get("__schema"))
        .filter(|schema| !schema.is_null())
        .cloned()
        .ok_or(IntrospectionError::MissingData)?;

    let handle = SchemaHandle::from_introspection(schema)?;
    debug!("Introspected schema:\n{}", handle.schema);
    Ok(handle)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    pub fn named(kind: &str, name: &str) -> Value {
        json!({"kind": kind, "name": name, "ofType": null})
    }

    pub fn non_null(of_type: Value) -> Value {
        json!({"kind": "NON_NULL", "name": null, "ofType": of_type})
    }

    pub fn object(name: &str, fields: Vec<Value>) -> Value {
        json!({
            "kind": "OBJECT",
            "name": name,
            "description": null,
            "fields": fields,
            "inputFields": null,
            "interfaces": [],
            "enumValues": null,
            "possibleTypes": null
        })
    }

    pub fn field(name: &str, args: Vec<Value>, ty: Value) -> Value {
        json!({
            "name": name,
            "description": null,
            "args": args,
            "type": ty,
            "isDeprecated": false,
            "deprecationReason": null
        })
    }

    pub fn todo_introspection() -> Value {
        json!({
            "data": {
                "__schema": {
                    "queryType": {"name": "Query"},
                    "mutationType": {"name": "Mutation"},
                    "subscriptionType": null,
                    "types": [
                        object("Query", vec![field(
                            "todos",
                            vec![json!({
                                "name": "take",
                                "description": null,
                                "type": named("SCALAR", "Int"),
                                "defaultValue": null
                            })],
                            non_null(json!({
                                "kind": "LIST",
                                "name": null,
                                "ofType": non_null(named("OBJECT", "Todo"))
                            })),
                        )]),
                        object("Mutation", vec![field(
                            "endSession",
                            vec![],
                            non_null(named("SCALAR", "Boolean")),
                        )]),
                        object("Todo", vec![
                            field("id", vec![], non_null(named("SCALAR", "ID"))),
                            field("label", vec![], named("SCALAR", "String")),
                        ]),
                        {
                            "kind": "SCALAR",
                            "name": "Boolean",
                            "description": "The `Boolean` scalar type",
                            "fields": null,
                            "inputFields": null,
                            "interfaces": null,
                            "enumValues": null,
                            "possibleTypes": null
                        },
                        object("__Type", vec![field("name", vec![], named("SCALAR", "String"))])
                    ],
                    "directives": []
                }
            }
        })
    }

    /// An introspection response whose query type has the given `Boolean` fields
    pub fn boolean_query(fields: &[&str]) -> Value {
        json!({
            "data": {
                "__schema": {
                    "queryType": {"name": "Query"},
                    "mutationType": null,
                    "subscriptionType": null,
                    "types": [object(
                        "Query",
                        fields
                            .iter()
                            .map(|name| field(name, vec![], named("SCALAR", "Boolean")))
                            .collect(),
                    )],
                    "directives": []
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::todo_introspection;
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use url::Url;

    async fn transport(server: &mockito::Server) -> AuthenticatedTransport {
        AuthenticatedTransport::builder()
            .endpoint(Url::parse(&format!("{}/api/graphql", server.url())).unwrap())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn rebuilds_the_schema() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/graphql")
            .match_body(mockito::Matcher::PartialJson(
                json!({"query": INTROSPECTION_QUERY}),
            ))
            .with_status(200)
            .with_body(todo_introspection().to_string())
            .create_async()
            .await;

        let handle = introspect(&transport(&server).await).await.unwrap();

        mock.assert_async().await;
        let query = handle.query_type().unwrap();
        assert_eq!(query.fields.len(), 1);
        assert_eq!(query.fields["todos"].ty.to_string(), "[Todo!]!");
        assert!(handle.mutation_type().is_some());
        assert!(handle.root_type(OperationType::Subscription).is_none());
        assert!(handle.schema().get_object("Todo").is_some());
        assert!(handle.schema().get_object("__Type").is_none());
    }

    #[rstest]
    #[case(500, json!({"data": null}))]
    #[case(401, json!({"errors": [{"message": "unauthorized"}]}))]
    #[tokio::test]
    async fn non_success_status_fails(#[case] status: usize, #[case] body: Value) {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/graphql")
            .with_status(status)
            .with_body(body.to_string())
            .create_async()
            .await;

        let error = introspect(&transport(&server).await).await.unwrap_err();

        assert!(matches!(error, IntrospectionError::Status(_)));
    }

    #[tokio::test]
    async fn graphql_errors_fail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/graphql")
            .with_status(200)
            .with_body(r#"{"errors":[{"message":"Introspection is disabled"}]}"#)
            .create_async()
            .await;

        let error = introspect(&transport(&server).await).await.unwrap_err();

        assert!(
            matches!(error, IntrospectionError::GraphQL(message) if message.contains("Introspection is disabled"))
        );
    }

    #[rstest]
    #[case(json!({"data": {}}))]
    #[case(json!({"data": {"__schema": null}}))]
    #[case(json!({}))]
    #[tokio::test]
    async fn missing_schema_fails(#[case] body: Value) {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/graphql")
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let error = introspect(&transport(&server).await).await.unwrap_err();

        assert!(matches!(error, IntrospectionError::MissingData));
    }

    #[tokio::test]
    async fn malformed_schema_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/graphql")
            .with_status(200)
            .with_body(r#"{"data":{"__schema":{"queryType":{"name":"Query"},"types":"nope"}}}"#)
            .create_async()
            .await;

        let error = introspect(&transport(&server).await).await.unwrap_err();

        assert!(matches!(error, IntrospectionError::Json(_)));
    }

    #[test]
    fn invalid_sdl_is_rejected() {
        assert!(matches!(
            SchemaHandle::parse("type Query { todos: [Todo] }"),
            Err(IntrospectionError::InvalidSchema(_))
        ));
    }

    #[test]
    fn prints_sdl() {
        let handle = SchemaHandle::parse(include_str!("testdata/todo.graphql")).unwrap();
        let sdl = handle.sdl();

        assert!(sdl.contains("todos(where: TodoWhereInput, take: Int): [Todo!]!"));
        assert!(sdl.contains("union AuthenticatedItem = User"));
    }
}
