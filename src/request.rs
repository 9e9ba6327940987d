// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! InstantSearch request model.
//!
//! Mirrors the JSON shape InstantSearch hands to a search client. Parameters
//! the adapter does not translate are ignored on deserialization.
//!
//! ```
//! use typesense_instantsearch_adapter::{SearchRequest, FacetFilter};
//! use serde_json::json;
//!
//! let request: SearchRequest = serde_json::from_value(json!({
//!     "indexName": "products/sort/price:asc",
//!     "params": {
//!         "query": "shoes",
//!         "facetFilters": [["brand:Nike", "brand:Adidas"], "color:red"],
//!         "page": 0
//!     }
//! })).unwrap();
//!
//! assert_eq!(request.params.query.as_deref(), Some("shoes"));
//! assert!(matches!(request.params.facet_filters.as_ref().unwrap()[1], FacetFilter::Single(_)));
//! ```

use std::fmt;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// The match-all query token.
pub const MATCH_ALL: &str = "*";

/// One InstantSearch search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Collection name, optionally suffixed with `/sort/<spec>`
    pub index_name: String,
    #[serde(default)]
    pub params: SearchParams,
}

impl SearchRequest {
    pub fn new(index_name: impl Into<String>, params: SearchParams) -> Self {
        Self {
            index_name: index_name.into(),
            params,
        }
    }

    /// Free-text query when it is worth enhancing (non-empty, not `*`).
    pub fn enhanceable_query(&self) -> Option<&str> {
        self.params
            .query
            .as_deref()
            .filter(|q| !q.is_empty() && *q != MATCH_ALL)
    }

    /// Copy of this request with only `params.query` replaced.
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        let mut request = self.clone();
        request.params.query = Some(query.into());
        request
    }
}

/// InstantSearch parameters the adapter translates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "string_or_list", skip_serializing_if = "Option::is_none")]
    pub facets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_filters: Option<Vec<FacetFilter>>,
    #[serde(default, deserialize_with = "string_or_list", skip_serializing_if = "Option::is_none")]
    pub numeric_filters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inside_bounding_box: Option<GeoCoordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub around_lat_lng: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub around_radius: Option<AroundRadius>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inside_polygon: Option<GeoCoordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_values_per_facet: Option<u32>,
    /// Zero-indexed page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits_per_page: Option<u32>,
    #[serde(default, deserialize_with = "string_or_list", skip_serializing_if = "Option::is_none")]
    pub rule_contexts: Option<Vec<String>>,
    /// Facet value search: facet being searched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_name: Option<String>,
    /// Facet value search: text typed into the facet search box
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_query: Option<String>,
}

/// One element of `facetFilters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacetFilter {
    /// `"field:value"`, its own AND clause
    Single(String),
    /// `["field:a", "field:b"]`, OR-ed inside one AND clause
    Group(Vec<String>),
}

/// A coordinate literal as sent by the UI: number or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

/// Bounding box / polygon coordinates in any of the accepted shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeoCoordinates {
    /// `"x1,y1,x2,y2"`
    Text(String),
    /// `[x1, y1, x2, y2]`
    Flat(Vec<Coordinate>),
    /// `[[x1, y1, x2, y2]]`
    Nested(Vec<Vec<Coordinate>>),
}

impl GeoCoordinates {
    /// Ordered, flattened coordinate literals.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::Text(s) => s
                .split(',')
                .map(|part| part.trim().to_string())
                .collect(),
            Self::Flat(coords) => coords.iter().map(ToString::to_string).collect(),
            Self::Nested(groups) => groups
                .iter()
                .flatten()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// `aroundRadius`: meters, or a sentinel such as `"all"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AroundRadius {
    Meters(f64),
    Other(String),
}

impl AroundRadius {
    pub fn meters(&self) -> Option<f64> {
        match self {
            Self::Meters(m) if m.is_finite() => Some(*m),
            Self::Meters(_) => None,
            // A numeric string is still a radius
            Self::Other(s) => s.trim().parse::<f64>().ok().filter(|m| m.is_finite()),
        }
    }
}

/// Accept either `"a"` or `["a", "b"]`.
fn string_or_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::One(s)) => Some(vec![s]),
        Some(OneOrMany::Many(v)) => Some(v),
    })
}
