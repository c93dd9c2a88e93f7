/// Generate a tool input schema from a type deriving `JsonSchema`
#[macro_export]
macro_rules! schema_from_type {
    ($type:ty) => {{
        match serde_json::to_value(schemars::schema_for!($type)) {
            Ok(serde_json::Value::Object(schema)) => schema,
            _ => {
                tracing::error!("Failed to generate schema for {}", stringify!($type));
                let mut schema = serde_json::Map::new();
                schema.insert("type".to_string(), "object".into());
                schema
            }
        }
    }};
}
