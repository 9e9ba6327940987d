// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Typesense multi-search wire types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AdapterError, Result};

/// One Typesense search inside a multi-search body.
///
/// `page` is 1-indexed and always present. Everything else is omitted
/// when unset; configured parameters without a named field ride in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeSearchParameters {
    pub collection: String,
    pub q: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_facet_values: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_overrides: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_query: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /multi_search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiSearchRequest {
    pub searches: Vec<NativeSearchParameters>,
}

/// Response of `POST /multi_search`, one result per search in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiSearchResponse {
    pub results: Vec<NativeResult>,
}

/// One per-search result. Only the fields the adapter inspects are typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouped_hits: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl NativeResult {
    /// Fail on an engine-reported error or a result without any hits collection.
    pub fn validate(&self) -> Result<()> {
        let code = || {
            self.code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        };

        if let Some(error) = &self.error {
            return Err(AdapterError::Engine {
                code: code(),
                message: error.clone(),
            });
        }
        if self.hits.is_none() && self.grouped_hits.is_none() {
            return Err(AdapterError::MissingHits {
                code: code(),
                message: "no error reported".to_string(),
            });
        }
        Ok(())
    }
}
