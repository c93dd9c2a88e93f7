//! The server's cached schema and the registry built from it

use crate::custom_scalar_map::CustomScalarMap;
use crate::errors::ServerError;
use crate::introspection::{SchemaHandle, introspect};
use crate::tools::{Registry, ToolOptions};
use crate::transport::AuthenticatedTransport;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug)]
struct Cached {
    schema: Arc<SchemaHandle>,
    registry: Arc<Registry>,
    fetched_at: Instant,
}

/// The current registry, and whether a refresh changed its tool names
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub registry: Arc<Registry>,
    pub tools_changed: bool,
}

/// Holds the introspected schema for every session of a server.
///
/// Without a TTL the schema fetched at startup is kept for the life of the server.
#[derive(Debug)]
pub struct SchemaCache {
    cached: RwLock<Cached>,
    ttl: Option<Duration>,
    options: ToolOptions,
    endpoint: Url,
    custom_scalar_map: Option<CustomScalarMap>,
}

impl SchemaCache {
    /// Introspect the endpoint and build the first registry
    pub async fn load(
        transport: &AuthenticatedTransport,
        ttl: Option<Duration>,
        options: ToolOptions,
        custom_scalar_map: Option<CustomScalarMap>,
    ) -> Result<Self, ServerError> {
        let schema = Arc::new(introspect(transport).await?);
        let endpoint = transport.endpoint().clone();
        let registry = Registry::build(
            Arc::clone(&schema),
            &options,
            &endpoint,
            custom_scalar_map.as_ref(),
        )?;
        info!(tools = registry.len(), "Loaded GraphQL schema");

        Ok(Self {
            cached: RwLock::new(Cached {
                schema,
                registry: Arc::new(registry),
                fetched_at: Instant::now(),
            }),
            ttl,
            options,
            endpoint,
            custom_scalar_map,
        })
    }

    pub async fn schema(&self) -> Arc<SchemaHandle> {
        Arc::clone(&self.cached.read().await.schema)
    }

    /// The registry to serve, re-introspecting through `transport` once the TTL has passed.
    ///
    /// A failed refresh keeps the previous registry.
    pub async fn current(&self, transport: &AuthenticatedTransport) -> Snapshot {
        {
            let cached = self.cached.read().await;
            if !self.is_stale(&cached) {
                return Snapshot {
                    registry: Arc::clone(&cached.registry),
                    tools_changed: false,
                };
            }
        }

        let mut cached = self.cached.write().await;
        // Another session may have refreshed while we waited for the lock
        if !self.is_stale(&cached) {
            return Snapshot {
                registry: Arc::clone(&cached.registry),
                tools_changed: false,
            };
        }

        debug!("Schema cache expired, re-introspecting");
        match self.rebuild(transport).await {
            Ok((schema, registry)) => {
                let tools_changed = registry.names() != cached.registry.names();
                if tools_changed {
                    info!(tools = ?registry.names(), "Tool list changed");
                }
                *cached = Cached {
                    schema,
                    registry: Arc::new(registry),
                    fetched_at: Instant::now(),
                };
                Snapshot {
                    registry: Arc::clone(&cached.registry),
                    tools_changed,
                }
            }
            Err(error) => {
                warn!(%error, "Failed to refresh GraphQL schema, keeping the cached one");
                cached.fetched_at = Instant::now();
                Snapshot {
                    registry: Arc::clone(&cached.registry),
                    tools_changed: false,
                }
            }
        }
    }

    fn is_stale(&self, cached: &Cached) -> bool {
        self.ttl.is_some_and(|ttl| cached.fetched_at.elapsed() >= ttl)
    }

    async fn rebuild(
        &self,
        transport: &AuthenticatedTransport,
    ) -> Result<(Arc<SchemaHandle>, Registry), ServerError> {
        let schema = Arc::new(introspect(transport).await?);
        let registry = Registry::build(
            Arc::clone(&schema),
            &self.options,
            &self.endpoint,
            self.custom_scalar_map.as_ref(),
        )?;
        Ok((schema, registry))
    }
}
