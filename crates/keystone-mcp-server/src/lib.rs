pub mod custom_scalar_map;
pub mod dispatcher;
pub mod errors;
mod graphql;
pub mod introspection;
pub mod json_schema;
pub mod operations;
pub mod schema_cache;
pub mod server;
pub mod server_handler;
pub mod session;
pub mod tools;
pub mod transport;
