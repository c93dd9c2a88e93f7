//! The Keystone GraphQL endpoint

use std::ops::Deref;

use serde::Deserialize;
use url::Url;

const DEFAULT_ENDPOINT: &str = "http://localhost:3003/api/graphql";

/// Where the Keystone GraphQL API is served; a local Keystone dev server unless configured
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(Url);

impl Endpoint {
    pub fn into_inner(self) -> Url {
        self.0
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        // Covered by `defaults_to_local_keystone`
        #[allow(clippy::unwrap_used)]
        Self(Url::parse(DEFAULT_ENDPOINT).unwrap())
    }
}

impl Deref for Endpoint {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
