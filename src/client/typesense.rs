// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Minimal Typesense HTTP client: `POST /multi_search` only.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::{AdapterError, Result};
use crate::search::{MultiSearchRequest, MultiSearchResponse};

use super::SearchClient;

const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

/// Error body Typesense returns on non-2xx
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct TypesenseClient {
    client: Client,
    /// Base URLs, used round-robin
    nodes: Vec<String>,
    next_node: AtomicUsize,
    api_key: String,
}

impl TypesenseClient {
    pub fn new(server: &ServerConfig) -> Result<Self> {
        if server.nodes.is_empty() {
            return Err(AdapterError::Client("no Typesense nodes configured".to_string()));
        }

        let timeout = Duration::from_secs(server.connection_timeout_seconds);
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            nodes: server.nodes.iter().map(|n| n.base_url()).collect(),
            next_node: AtomicUsize::new(0),
            api_key: server.api_key.clone(),
        })
    }

    fn node(&self) -> &str {
        let idx = self.next_node.fetch_add(1, Ordering::Relaxed) % self.nodes.len();
        &self.nodes[idx]
    }
}

impl fmt::Debug for TypesenseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypesenseClient")
            .field("nodes", &self.nodes)
            .field("has_api_key", &!self.api_key.is_empty())
            .finish()
    }
}

/// Common parameters go on the query string.
fn query_pairs(options: &Map<String, Value>) -> Vec<(String, String)> {
    options
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}

#[async_trait]
impl SearchClient for TypesenseClient {
    async fn multi_search(
        &self,
        request: &MultiSearchRequest,
        options: &Map<String, Value>,
    ) -> Result<MultiSearchResponse> {
        let url = format!("{}/multi_search", self.node());
        debug!(url = %url, searches = request.searches.len(), "Typesense multi_search");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&query_pairs(options))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdapterError::Client(format!("Typesense request timeout: {}", e))
                } else if e.is_connect() {
                    AdapterError::Client(format!("Failed to connect to Typesense: {}", e))
                } else {
                    AdapterError::Client(format!("Typesense request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or(body);
            return Err(AdapterError::Engine {
                code: status.as_u16().to_string(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AdapterError::Client(format!("Failed to parse multi_search response: {}", e)))
    }
}
