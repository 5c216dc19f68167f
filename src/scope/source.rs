//! Factory-list sources.
//!
//! The resolver only ever needs one query: the active factories, ordered
//! by code. `RestFactorySource` issues it against the managed backend's
//! REST interface; `StaticFactorySource` serves a fixed list for tests
//! and offline tooling.

use async_trait::async_trait;

use crate::config::ScopeConfig;
use crate::errors::SourceError;

use super::models::Factory;

#[async_trait]
pub trait FactorySource: Send + Sync {
    /// Fetch the active factories, ordered by factory code.
    async fn fetch_active_factories(&self) -> Result<Vec<Factory>, SourceError>;
}

/// REST-backed source. The backend exposes tables through a PostgREST
/// interface, so the active-only ordered list is a single filtered GET.
pub struct RestFactorySource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestFactorySource {
    pub fn new(config: &ScopeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn factories_url(&self) -> String {
        format!("{}/rest/v1/factories", self.base_url)
    }
}

#[async_trait]
impl FactorySource for RestFactorySource {
    async fn fetch_active_factories(&self) -> Result<Vec<Factory>, SourceError> {
        let response = self
            .client
            .get(self.factories_url())
            .query(&[
                ("select", "*"),
                ("is_active", "eq.true"),
                ("order", "factory_code"),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(SourceError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status { status });
        }

        response
            .json::<Vec<Factory>>()
            .await
            .map_err(SourceError::Decode)
    }
}

/// In-memory source with a fixed factory list.
pub struct StaticFactorySource {
    factories: Vec<Factory>,
}

impl StaticFactorySource {
    pub fn new(factories: Vec<Factory>) -> Self {
        Self { factories }
    }
}

#[async_trait]
impl FactorySource for StaticFactorySource {
    async fn fetch_active_factories(&self) -> Result<Vec<Factory>, SourceError> {
        Ok(self.factories.clone())
    }
}
