// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Request Adapter
//!
//! Turns one batch of InstantSearch requests into one Typesense multi-search.
//!
//! ```text
//! [SearchRequest]
//!       │
//!       ├─→ QueryEnhancementCache::enhance_all   (unique queries, parallel)
//!       │
//!       ├─→ per request: SortResolver + FilterTranslator + configured params
//!       │                  → NativeSearchParameters
//!       │
//!       └─→ SearchClient::multi_search { searches } (input order)
//! ```

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::client::SearchClient;
use crate::config::AdapterConfig;
use crate::enhancement::QueryEnhancementCache;
use crate::error::{AdapterError, Result};
use crate::metrics;
use crate::request::{SearchRequest, MATCH_ALL};
use crate::search::{
    FilterTranslator, MultiSearchRequest, MultiSearchResponse, NativeSearchParameters,
    SortResolver,
};

/// Adapter for a single batch, borrowing the long-lived adapter state.
pub struct RequestAdapter<'a> {
    config: &'a AdapterConfig,
    client: &'a dyn SearchClient,
    cache: &'a QueryEnhancementCache,
}

fn take_string(params: &mut Map<String, Value>, key: &str) -> Option<String> {
    match params.remove(key)? {
        Value::String(s) => Some(s),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Integer slots are checked by [`AdapterConfig::validate`].
fn take_u32(params: &mut Map<String, Value>, key: &str) -> Option<u32> {
    params
        .remove(key)?
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
}

fn take_bool(params: &mut Map<String, Value>, key: &str) -> Option<bool> {
    params.remove(key)?.as_bool()
}

/// Treat an empty derived string as absent.
fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

impl<'a> RequestAdapter<'a> {
    pub fn new(
        config: &'a AdapterConfig,
        client: &'a dyn SearchClient,
        cache: &'a QueryEnhancementCache,
    ) -> Self {
        Self {
            config,
            client,
            cache,
        }
    }

    /// Native parameters for one (already enhanced) request.
    ///
    /// Fails before any network call on a bad filter or unknown sort spec.
    pub fn build_search(&self, request: &SearchRequest) -> Result<NativeSearchParameters> {
        let params = &request.params;
        let resolved = SortResolver::new(self.config).resolve(&request.index_name)?;
        let collection = resolved.collection;
        let translator = FilterTranslator::new(self.config);

        let mut extra = self.config.search_parameters(&collection);
        let (sort_by, enable_overrides) = match resolved.sort {
            Some(sort) => {
                extra.extend(sort.extra);
                (Some(sort.sort_by), sort.enable_overrides)
            }
            None => (None, None),
        };

        // Keys with a typed slot never ride in `extra`
        extra.remove("collection");
        extra.remove("q");
        extra.remove("page");
        extra.remove("facet_query");
        let configured_query_by = take_string(&mut extra, "query_by");
        let configured_filter_by = take_string(&mut extra, "filter_by");
        let configured_sort_by = take_string(&mut extra, "sort_by");
        let configured_facet_by = take_string(&mut extra, "facet_by");
        let configured_per_page = take_u32(&mut extra, "per_page");
        let configured_max_facet_values = take_u32(&mut extra, "max_facet_values");
        let configured_override_tags = take_string(&mut extra, "override_tags");
        let configured_enable_overrides = take_bool(&mut extra, "enable_overrides");

        let filter_by = non_empty(translator.filter_by(params, Some(&collection))?);
        let facet_by = params
            .facets
            .as_deref()
            .map(|facets| translator.facet_by(facets, Some(&collection)))
            .and_then(non_empty);
        let override_tags = params
            .rule_contexts
            .as_deref()
            .map(FilterTranslator::override_tags)
            .and_then(non_empty);

        let facet_query = match (&params.facet_name, &params.facet_query) {
            (Some(name), Some(query)) => Some(format!("{}:{}", name, query)),
            (None, Some(query)) => {
                return Err(AdapterError::facet(query, "facet value search requires facetName"))
            }
            _ => None,
        };

        let per_page = if facet_query.is_some() {
            Some(0)
        } else {
            params.hits_per_page.or(configured_per_page)
        };

        let q = params
            .query
            .as_deref()
            .filter(|q| !q.is_empty())
            .unwrap_or(MATCH_ALL)
            .to_string();

        Ok(NativeSearchParameters {
            collection,
            q,
            query_by: configured_query_by,
            filter_by: filter_by.or(configured_filter_by),
            facet_by: configured_facet_by.or(facet_by),
            sort_by: sort_by.or(configured_sort_by),
            page: params.page.unwrap_or(0).saturating_add(1),
            per_page,
            max_facet_values: params.max_values_per_facet.or(configured_max_facet_values),
            override_tags: override_tags.or(configured_override_tags),
            enable_overrides: enable_overrides.or(configured_enable_overrides),
            facet_query,
            extra,
        })
    }

    /// Build every search in input order.
    pub fn build_searches<'r, I>(&self, requests: I) -> Result<Vec<NativeSearchParameters>>
    where
        I: IntoIterator<Item = &'r SearchRequest>,
    {
        requests
            .into_iter()
            .map(|request| {
                self.build_search(request).inspect_err(|e| {
                    warn!(index = %request.index_name, error = %e, "Rejected search request");
                    metrics::record_request_error(error_kind(e));
                })
            })
            .collect()
    }

    /// Enhance, translate, and issue exactly one multi-search call.
    ///
    /// The raw response is returned as-is; per-result validation is the
    /// caller's job.
    pub async fn request(
        &self,
        requests: &[SearchRequest],
        options: &Map<String, Value>,
        operation: &'static str,
    ) -> Result<MultiSearchResponse> {
        let enhanced = self.cache.enhance_all(requests).await;
        let searches = self.build_searches(enhanced.iter().map(|r| &**r))?;

        debug!(operation, searches = searches.len(), "Dispatching multi_search");
        metrics::record_batch_size(searches.len());

        let body = MultiSearchRequest { searches };
        let _timer = metrics::LatencyTimer::new(operation);
        match self.client.multi_search(&body, options).await {
            Ok(response) => {
                metrics::record_multi_search(operation, "success");
                Ok(response)
            }
            Err(e) => {
                metrics::record_multi_search(operation, "error");
                Err(e)
            }
        }
    }
}

fn error_kind(e: &AdapterError) -> &'static str {
    match e {
        AdapterError::InvalidGeoFilter(_) => "geo",
        AdapterError::InvalidNumericFilter { .. } => "numeric",
        AdapterError::InvalidFacetFilter { .. } => "facet",
        AdapterError::UnknownSortOption { .. } => "sort",
        _ => "other",
    }
}
