// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Outbound seams: the Typesense search client and the enhancement service.
//!
//! The adapter only talks to these traits. [`HttpConnector`] builds the
//! reqwest-backed implementations from configuration; tests plug in their own.

mod typesense;

pub use typesense::TypesenseClient;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::{QueryEnhancementConfig, ServerConfig};
use crate::enhancement::{HttpQueryEnhancer, NoopEnhancer, QueryEnhancer};
use crate::error::{AdapterError, Result};
use crate::search::{MultiSearchRequest, MultiSearchResponse};

/// Typesense multi-search.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// One batched call. `options` are passed through untouched as common
    /// parameters for every search in the batch.
    async fn multi_search(
        &self,
        request: &MultiSearchRequest,
        options: &Map<String, Value>,
    ) -> Result<MultiSearchResponse>;
}

/// Builds the outbound clients from configuration.
///
/// Called at construction, on [`clear_cache`] and on configuration updates.
///
/// [`clear_cache`]: crate::InstantSearchAdapter::clear_cache
pub trait Connector: Send + Sync {
    fn search_client(&self, server: &ServerConfig) -> Result<Arc<dyn SearchClient>>;
    fn query_enhancer(&self, config: &QueryEnhancementConfig) -> Result<Arc<dyn QueryEnhancer>>;
}

/// reqwest-backed [`Connector`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn search_client(&self, server: &ServerConfig) -> Result<Arc<dyn SearchClient>> {
        Ok(Arc::new(TypesenseClient::new(server)?))
    }

    fn query_enhancer(&self, config: &QueryEnhancementConfig) -> Result<Arc<dyn QueryEnhancer>> {
        if !config.enabled {
            return Ok(Arc::new(NoopEnhancer));
        }
        let enhancer =
            HttpQueryEnhancer::from_config(config).map_err(|e| AdapterError::Client(e.to_string()))?;
        Ok(Arc::new(enhancer))
    }
}
