// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Adapter coordinator.
//!
//! The [`InstantSearchAdapter`] is the long-lived entry point that ties
//! together all components:
//! - Validated [`AdapterConfig`]
//! - Typesense [`SearchClient`]
//! - [`QueryEnhancementCache`] for free-text query rewrites
//!
//! Each call takes a snapshot of that state, so a concurrent
//! [`update_configuration`](InstantSearchAdapter::update_configuration)
//! never changes a batch halfway through.
//!
//! # Example
//!
//! ```rust,no_run
//! use typesense_instantsearch_adapter::{AdapterConfig, InstantSearchAdapter, SearchRequest};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AdapterConfig::from_value(json!({
//!     "server": {
//!         "apiKey": "xyz",
//!         "nodes": [{ "host": "localhost", "port": 8108, "protocol": "http" }]
//!     },
//!     "additionalSearchParameters": { "queryBy": "name" }
//! }))?;
//! let adapter = InstantSearchAdapter::new(config)?;
//!
//! let requests: Vec<SearchRequest> = serde_json::from_value(json!([
//!     { "indexName": "products", "params": { "query": "shoes", "page": 0 } }
//! ]))?;
//! let response = adapter.search(&requests).await?;
//! assert_eq!(response.results.len(), 1);
//! # Ok(())
//! # }
//! ```

mod lifecycle;
mod request_adapter;
mod search_api;

pub use request_adapter::RequestAdapter;

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::client::{Connector, HttpConnector, SearchClient};
use crate::config::AdapterConfig;
use crate::enhancement::{EnhancementCacheStats, QueryEnhancementCache};
use crate::error::Result;

/// Everything one batch needs, swapped as a unit.
#[derive(Clone)]
pub(super) struct AdapterState {
    pub(super) config: Arc<AdapterConfig>,
    pub(super) client: Arc<dyn SearchClient>,
    pub(super) cache: Arc<QueryEnhancementCache>,
}

/// InstantSearch search client backed by Typesense.
///
/// # Thread Safety
///
/// The adapter is `Send + Sync`. Share it behind an `Arc`; every method
/// takes `&self`.
pub struct InstantSearchAdapter {
    connector: Arc<dyn Connector>,
    pub(super) state: RwLock<AdapterState>,
}

impl InstantSearchAdapter {
    /// Create an adapter with the reqwest-backed clients.
    pub fn new(config: AdapterConfig) -> Result<Self> {
        Self::with_connector(config, Arc::new(HttpConnector))
    }

    /// Create an adapter whose outbound clients come from `connector`.
    pub fn with_connector(config: AdapterConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        config.validate()?;
        let state = Self::connect(connector.as_ref(), config)?;
        info!(
            nodes = state.config.server.nodes.len(),
            enhancement = state.cache.is_enabled(),
            "InstantSearch adapter created"
        );
        Ok(Self {
            connector,
            state: RwLock::new(state),
        })
    }

    /// Build fresh clients and an empty cache for `config`.
    pub(super) fn connect(connector: &dyn Connector, config: AdapterConfig) -> Result<AdapterState> {
        let client = connector.search_client(&config.server)?;
        let enhancer = connector.query_enhancer(&config.query_enhancement)?;
        let cache = Arc::new(QueryEnhancementCache::new(enhancer, &config.query_enhancement));
        Ok(AdapterState {
            config: Arc::new(config),
            client,
            cache,
        })
    }

    pub(super) fn snapshot(&self) -> AdapterState {
        self.state.read().clone()
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> Arc<AdapterConfig> {
        Arc::clone(&self.state.read().config)
    }

    #[must_use]
    pub fn enhancement_stats(&self) -> EnhancementCacheStats {
        self.state.read().cache.stats()
    }
}
