//! Runtime utilities
//!
//! This module is only used by the binaries and provides helper code
//! related to runtime configuration.

mod config;
mod endpoint;
mod logging;

use std::path::Path;

pub use config::Config;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};

/// Separator to use when drilling down into nested options in the env figment
const ENV_NESTED_SEPARATOR: &str = "__";

/// Read configuration from environment variables only (when no config file is provided)
#[allow(clippy::result_large_err)]
pub fn read_config_from_env() -> Result<Config, figment::Error> {
    Figment::new()
        .join(graphql_endpoint_env())
        .join(Env::prefixed("KEYSTONE_MCP_").split(ENV_NESTED_SEPARATOR))
        .extract()
}

/// Read in a config from a YAML file, filling in any missing values from the environment
#[allow(clippy::result_large_err)]
pub fn read_config(yaml_path: impl AsRef<Path>) -> Result<Config, figment::Error> {
    Figment::new()
        .join(graphql_endpoint_env())
        .join(Env::prefixed("KEYSTONE_MCP_").split(ENV_NESTED_SEPARATOR))
        .join(Yaml::file(yaml_path))
        .extract()
}

/// Figment provider mapping the conventional `GRAPHQL_ENDPOINT` variable onto `endpoint`
fn graphql_endpoint_env() -> Env {
    Env::raw()
        .only(&["graphql_endpoint"])
        .map(|_| "endpoint".into())
}

#[cfg(test)]
mod test {
    use super::{read_config, read_config_from_env};
    use keystone_mcp_server::operations::MutationMode;
    use keystone_mcp_server::server::Transport;
    use keystone_mcp_server::tools::RegistryMode;
    use std::time::Duration;

    #[test]
    fn it_defaults_to_the_local_keystone() {
        figment::Jail::expect_with(|_jail| {
            let config = read_config_from_env()?;

            assert_eq!(
                config.endpoint.as_str(),
                "http://localhost:3003/api/graphql"
            );
            assert_eq!(config.transport, Transport::Stdio);
            assert_eq!(config.tools.mode, RegistryMode::Model);
            assert_eq!(config.tools.mutation_mode, MutationMode::Explicit);
            assert!(config.schema_cache.ttl.is_none());
            Ok(())
        });
    }

    #[test]
    fn it_reads_graphql_endpoint() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GRAPHQL_ENDPOINT", "https://todos.example.com/api/graphql");

            let config = read_config_from_env()?;

            assert_eq!(
                config.endpoint.as_str(),
                "https://todos.example.com/api/graphql"
            );
            Ok(())
        });
    }

    #[test]
    fn it_prioritizes_env_vars() {
        let config = r#"
            session_cookie: keystonejs-session=from_file
        "#;

        figment::Jail::expect_with(move |jail| {
            let path = "config.yaml";

            jail.create_file(path, config)?;
            jail.set_env("KEYSTONE_MCP_SESSION_COOKIE", "keystonejs-session=from_env");

            let config = read_config(path)?;

            assert_eq!(
                config.session_cookie.as_deref(),
                Some("keystonejs-session=from_env")
            );
            Ok(())
        });
    }

    #[test]
    fn it_extracts_nested_env() {
        let config = r#"
            tools:
                mode: schema
        "#;

        figment::Jail::expect_with(move |jail| {
            let path = "config.yaml";

            jail.create_file(path, config)?;
            jail.set_env("KEYSTONE_MCP_TOOLS__MUTATION_MODE", "all");
            jail.set_env("KEYSTONE_MCP_SCHEMA_CACHE__TTL", "5m");

            let config = read_config(path)?;

            assert_eq!(config.tools.mode, RegistryMode::Schema);
            assert_eq!(config.tools.mutation_mode, MutationMode::All);
            assert_eq!(config.schema_cache.ttl, Some(Duration::from_secs(300)));
            Ok(())
        });
    }

    #[test]
    fn it_reads_a_full_file() {
        let config = r#"
            endpoint: http://keystone:3000/api/graphql
            headers:
                x-client: keystone-mcp
            timeout: 30s
            transport:
                type: streamable_http
                port: 8000
            logging:
                level: debug
                rotation: daily
            tools:
                max_depth: 2
                execute: false
                models:
                    - name: Todo
                      selection: id label isComplete
                      search_fields: [label]
        "#;

        figment::Jail::expect_with(move |jail| {
            let path = "config.yaml";
            jail.create_file(path, config)?;

            let config = read_config(path)?;

            assert_eq!(config.endpoint.as_str(), "http://keystone:3000/api/graphql");
            assert_eq!(config.headers["x-client"], "keystone-mcp");
            assert_eq!(config.timeout, Some(Duration::from_secs(30)));
            assert!(matches!(
                config.transport,
                Transport::StreamableHttp { port: 8000, ref base_path, .. } if base_path == "/api/mcp"
            ));
            assert_eq!(config.logging.level, tracing::Level::DEBUG);
            assert_eq!(config.tools.max_depth, 2);
            assert!(!config.tools.execute);
            assert_eq!(config.tools.models.len(), 1);
            assert_eq!(config.tools.models[0].search_fields, vec!["label"]);
            Ok(())
        });
    }
}
