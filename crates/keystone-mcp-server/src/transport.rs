//! Authenticated execution of GraphQL documents
//!
//! Each transport owns its own HTTP client and [`CookieJar`]. The jar is installed as the
//! client's cookie store, so every outbound request carries the session cookies and every
//! `Set-Cookie` response header is captured for the rest of the session. Nothing here
//! touches process-wide state, so concurrent sessions never observe each other's cookies.

mod cookie_jar;

use crate::errors::{GraphQLExecutionError, TransportError};
use bon::bon;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub use cookie_jar::CookieJar;

/// A decoded GraphQL response
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Value,
}

impl Response {
    /// The non-empty `errors` array of the response, if any
    pub fn errors(&self) -> Option<&Vec<Value>> {
        self.body
            .get("errors")
            .and_then(Value::as_array)
            .filter(|errors| !errors.is_empty())
    }

    pub fn execution_error(&self) -> Option<GraphQLExecutionError> {
        self.errors().map(|errors| GraphQLExecutionError {
            errors: errors.clone(),
        })
    }

    /// Whether the response carries any non-null `data`
    pub fn has_data(&self) -> bool {
        self.body
            .get("data")
            .is_some_and(|data| !matches!(data, Value::Null))
    }
}

/// Executes GraphQL documents against a fixed endpoint on behalf of one session
#[derive(Debug)]
pub struct AuthenticatedTransport {
    client: reqwest::Client,
    endpoint: Url,
    jar: Arc<CookieJar>,
    closed: AtomicBool,
}

#[bon]
impl AuthenticatedTransport {
    #[builder]
    pub fn new(
        endpoint: Url,
        #[builder(default)] headers: HeaderMap,
        initial_cookie: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let jar = Arc::new(CookieJar::new(initial_cookie.as_deref()));
        let mut client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar));
        if let Some(timeout) = timeout {
            client = client.timeout(timeout);
        }

        Ok(Self {
            client: client.build().map_err(TransportError::Client)?,
            endpoint,
            jar,
            closed: AtomicBool::new(false),
        })
    }
}

impl AuthenticatedTransport {
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn cookie_jar(&self) -> &CookieJar {
        &self.jar
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// POST a document and its variables to the endpoint.
    ///
    /// A response with a GraphQL `errors` array is still returned; it is only logged here.
    pub async fn execute(&self, query: &str, variables: Value) -> Result<Response, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let mut body = Map::new();
        body.insert("query".to_string(), Value::String(query.to_string()));
        if !variables.is_null() {
            body.insert("variables".to_string(), variables);
        }

        debug!(endpoint = %self.endpoint, "Executing GraphQL document:\n{query}");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(TransportError::Request)?;

        let status = response.status();
        let body = response
            .json::<Value>()
            .await
            .map_err(|source| TransportError::Decode { status, source })?;

        let response = Response { status, body };
        if let Some(error) = response.execution_error() {
            warn!(%status, "{error}");
        }
        Ok(response)
    }

    /// Stop executing and forget every cookie collected for the session.
    ///
    /// Safe to call more than once. Dropping the transport closes it as well, so cancelled
    /// sessions release their cookies too.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(endpoint = %self.endpoint, "Closing transport");
        }
        self.jar.clear();
    }
}

impl Drop for AuthenticatedTransport {
    fn drop(&mut self) {
        self.close();
    }
}
