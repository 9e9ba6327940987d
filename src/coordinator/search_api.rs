// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search API for InstantSearchAdapter
//!
//! ```text
//! search(requests) / search_for_facet_values(requests)
//!       │
//!       ├─→ snapshot state (config, client, cache)
//!       │
//!       ├─→ RequestAdapter::request  (enhance → translate → one multi_search)
//!       │
//!       └─→ validate every result: `error` or no hits → AdapterError
//! ```

use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::{AdapterError, Result};
use crate::metrics;
use crate::request::SearchRequest;
use crate::search::{MultiSearchResponse, NativeResult};

use super::{InstantSearchAdapter, RequestAdapter};

const SEARCH: &str = "search";
const FACET_SEARCH: &str = "facet_search";

impl InstantSearchAdapter {
    /// Run a batch of InstantSearch requests as one Typesense multi-search.
    ///
    /// Results come back in request order. The first result carrying an
    /// engine error fails the whole batch.
    pub async fn search(&self, requests: &[SearchRequest]) -> Result<MultiSearchResponse> {
        self.search_with_options(requests, &Map::new()).await
    }

    /// [`search`](Self::search) with batch-level options passed through to
    /// the search client untouched.
    pub async fn search_with_options(
        &self,
        requests: &[SearchRequest],
        options: &Map<String, Value>,
    ) -> Result<MultiSearchResponse> {
        self.perform(requests, options, SEARCH).await
    }

    /// Facet value search: each request carries `facetName` and `facetQuery`.
    pub async fn search_for_facet_values(
        &self,
        requests: &[SearchRequest],
    ) -> Result<Vec<NativeResult>> {
        let response = self.perform(requests, &Map::new(), FACET_SEARCH).await?;
        Ok(response.results)
    }

    async fn perform(
        &self,
        requests: &[SearchRequest],
        options: &Map<String, Value>,
        operation: &'static str,
    ) -> Result<MultiSearchResponse> {
        let state = self.snapshot();
        let adapter = RequestAdapter::new(&state.config, state.client.as_ref(), &state.cache);

        let response = adapter
            .request(requests, options, operation)
            .await
            .inspect_err(|e| error!(operation, error = %e, "Search request failed"))?;

        for (index, result) in response.results.iter().enumerate() {
            result.validate().inspect_err(|e| {
                metrics::record_engine_error(engine_error_kind(e));
                error!(operation, index, error = %e, "Typesense returned an error result");
            })?;
        }

        debug!(operation, results = response.results.len(), "Search completed");
        Ok(response)
    }
}

fn engine_error_kind(e: &AdapterError) -> &'static str {
    match e {
        AdapterError::MissingHits { .. } => "missing_hits",
        _ => "engine",
    }
}
