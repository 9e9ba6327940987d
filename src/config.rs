// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the adapter.
//!
//! Deserializes from the same camelCase JSON options object the InstantSearch
//! adapter has always accepted, but unknown keys are rejected and
//! [`AdapterConfig::validate`] runs once at construction rather than failing
//! deep inside filter translation.
//!
//! # Example
//!
//! ```
//! use typesense_instantsearch_adapter::AdapterConfig;
//!
//! // Minimal config (uses defaults)
//! let config = AdapterConfig::default();
//! assert_eq!(config.geo_location_field, "_geoloc");
//! assert!(!config.query_enhancement.enabled);
//!
//! // From the JSON options object
//! let config = AdapterConfig::from_json(r#"{
//!     "server": { "apiKey": "xyz", "nodes": [{ "host": "localhost", "port": 8108, "protocol": "http" }] },
//!     "additionalSearchParameters": { "queryBy": "name,description" },
//!     "sortByOptions": { "price:asc": { "enable_overrides": false } },
//!     "queryEnhancement": { "enabled": true, "url": "http://localhost:9000/enhance" }
//! }"#).unwrap();
//! assert_eq!(config.query_enhancement.timeout, 5000);
//! ```

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Configuration errors, raised by [`AdapterConfig::validate`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("server.nodes must contain at least one node")]
    NoServerNodes,
    #[error("server.nodes[{0}].host is empty")]
    EmptyHost(usize),
    #[error("queryEnhancement.url is required when query enhancement is enabled")]
    MissingEnhancementUrl,
    #[error("queryEnhancement.timeout must be greater than zero")]
    ZeroEnhancementTimeout,
    #[error("facetableFieldsWithSpecialCharacters contains an empty field name")]
    EmptySpecialField,
    #[error("sort option keys must not be empty (collection: {0})")]
    EmptySortSpec(String),
    #[error("geoLocationField must not be empty")]
    EmptyGeoField,
    #[error("search parameter '{key}' must be a non-negative integer (collection: {collection})")]
    NonIntegerParameter { collection: String, key: String },
}

/// Adapter configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdapterConfig {
    /// Typesense connection settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Parameters merged into every native search (camelCase keys are snake_cased)
    #[serde(default)]
    pub additional_search_parameters: Map<String, Value>,

    /// Per-collection parameters layered over `additional_search_parameters`
    #[serde(default)]
    pub collection_specific_search_parameters: HashMap<String, Map<String, Value>>,

    #[serde(default)]
    pub query_enhancement: QueryEnhancementConfig,

    /// Global sort registry: sort spec → extra flags
    #[serde(default)]
    pub sort_by_options: HashMap<String, SortOption>,

    /// Collection → sort spec → extra flags. Replaces the global entry.
    #[serde(default)]
    pub collection_specific_sort_by_options: HashMap<String, HashMap<String, SortOption>>,

    #[serde(default)]
    pub filter_by_options: HashMap<String, FieldFilterConfig>,

    #[serde(default)]
    pub collection_specific_filter_by_options: HashMap<String, HashMap<String, FieldFilterConfig>>,

    /// Field → opaque facet_by directive, e.g. `(sort_by: _alpha:asc)`
    #[serde(default)]
    pub facet_by_options: HashMap<String, String>,

    #[serde(default)]
    pub collection_specific_facet_by_options: HashMap<String, HashMap<String, String>>,

    /// Field names that embed colons or operator characters in the name itself
    #[serde(default)]
    pub facetable_fields_with_special_characters: Vec<String>,

    #[serde(default = "default_geo_location_field")]
    pub geo_location_field: String,
}

/// Typesense client connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_nodes")]
    pub nodes: Vec<NodeConfig>,
    #[serde(default = "default_connection_timeout_seconds")]
    pub connection_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NodeConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default)]
    pub path: String,
}

impl NodeConfig {
    /// Base URL for this node, e.g. `http://localhost:8108`
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.protocol,
            self.host,
            self.port,
            self.path.trim_end_matches('/')
        )
    }
}

/// Query enhancement service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QueryEnhancementConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    /// Per-call timeout in milliseconds
    #[serde(default = "default_enhancement_timeout_ms")]
    pub timeout: u64,
}

impl QueryEnhancementConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

/// Per-field facet filter behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldFilterConfig {
    #[serde(default = "default_exact_match")]
    pub exact_match: bool,
}

impl Default for FieldFilterConfig {
    fn default() -> Self {
        Self {
            exact_match: default_exact_match(),
        }
    }
}

/// Flags attached to a registered sort spec.
///
/// `enable_overrides` is the only flag Typesense documents for this purpose;
/// anything else is carried through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SortOption {
    #[serde(default)]
    pub enable_overrides: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_geo_location_field() -> String { "_geoloc".to_string() }
fn default_nodes() -> Vec<NodeConfig> {
    vec![NodeConfig {
        host: "localhost".to_string(),
        port: default_port(),
        protocol: default_protocol(),
        path: String::new(),
    }]
}
fn default_port() -> u16 { 8108 }
fn default_protocol() -> String { "http".to_string() }
fn default_connection_timeout_seconds() -> u64 { 2 }
fn default_enhancement_timeout_ms() -> u64 { 5000 }
fn default_exact_match() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            nodes: default_nodes(),
            connection_timeout_seconds: default_connection_timeout_seconds(),
        }
    }
}

impl Default for QueryEnhancementConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            timeout: default_enhancement_timeout_ms(),
        }
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            additional_search_parameters: Map::new(),
            collection_specific_search_parameters: HashMap::new(),
            query_enhancement: QueryEnhancementConfig::default(),
            sort_by_options: HashMap::new(),
            collection_specific_sort_by_options: HashMap::new(),
            filter_by_options: HashMap::new(),
            collection_specific_filter_by_options: HashMap::new(),
            facet_by_options: HashMap::new(),
            collection_specific_facet_by_options: HashMap::new(),
            facetable_fields_with_special_characters: Vec::new(),
            geo_location_field: default_geo_location_field(),
        }
    }
}

impl AdapterConfig {
    /// Parse the JSON options object and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Same as [`from_json`](Self::from_json) for an already-parsed value.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.nodes.is_empty() {
            return Err(ConfigError::NoServerNodes);
        }
        if let Some(idx) = self.server.nodes.iter().position(|n| n.host.trim().is_empty()) {
            return Err(ConfigError::EmptyHost(idx));
        }

        if self.query_enhancement.enabled {
            if self.query_enhancement.url.trim().is_empty() {
                return Err(ConfigError::MissingEnhancementUrl);
            }
            if self.query_enhancement.timeout == 0 {
                return Err(ConfigError::ZeroEnhancementTimeout);
            }
        }

        if self
            .facetable_fields_with_special_characters
            .iter()
            .any(|f| f.is_empty())
        {
            return Err(ConfigError::EmptySpecialField);
        }

        if self.sort_by_options.keys().any(|k| k.is_empty()) {
            return Err(ConfigError::EmptySortSpec("*".to_string()));
        }
        for (collection, options) in &self.collection_specific_sort_by_options {
            if options.keys().any(|k| k.is_empty()) {
                return Err(ConfigError::EmptySortSpec(collection.clone()));
            }
        }

        if self.geo_location_field.trim().is_empty() {
            return Err(ConfigError::EmptyGeoField);
        }

        check_integer_parameters("*", &self.additional_search_parameters)?;
        for option in self.sort_by_options.values() {
            check_integer_parameters("*", &option.extra)?;
        }
        for (collection, params) in &self.collection_specific_search_parameters {
            check_integer_parameters(collection, params)?;
        }
        for (collection, options) in &self.collection_specific_sort_by_options {
            for option in options.values() {
                check_integer_parameters(collection, &option.extra)?;
            }
        }

        Ok(())
    }

    /// Two-level lookup: collection-specific, then global, then `true`.
    pub fn exact_match(&self, collection: Option<&str>, field: &str) -> bool {
        collection
            .and_then(|c| self.collection_specific_filter_by_options.get(c))
            .and_then(|fields| fields.get(field))
            .or_else(|| self.filter_by_options.get(field))
            .map(|opts| opts.exact_match)
            .unwrap_or_else(default_exact_match)
    }

    /// Facet-by directive for a field; a collection entry replaces the global one.
    pub fn facet_by_directive(&self, collection: Option<&str>, field: &str) -> Option<&str> {
        collection
            .and_then(|c| self.collection_specific_facet_by_options.get(c))
            .and_then(|fields| fields.get(field))
            .or_else(|| self.facet_by_options.get(field))
            .map(String::as_str)
    }

    /// Sort registry entry for a spec; a collection entry replaces the global one.
    pub fn sort_option(&self, collection: &str, spec: &str) -> Option<&SortOption> {
        self.collection_specific_sort_by_options
            .get(collection)
            .and_then(|options| options.get(spec))
            .or_else(|| self.sort_by_options.get(spec))
    }

    /// Additional search parameters for a collection, keys in snake_case.
    pub fn search_parameters(&self, collection: &str) -> Map<String, Value> {
        let mut merged: Map<String, Value> = self
            .additional_search_parameters
            .iter()
            .map(|(k, v)| (camel_to_snake_case(k), v.clone()))
            .collect();

        if let Some(specific) = self.collection_specific_search_parameters.get(collection) {
            for (k, v) in specific {
                merged.insert(camel_to_snake_case(k), v.clone());
            }
        }
        merged
    }
}

/// Parameters that land in an integer slot of the native search.
const INTEGER_PARAMETERS: [&str; 2] = ["per_page", "max_facet_values"];

fn check_integer_parameters(collection: &str, params: &Map<String, Value>) -> Result<(), ConfigError> {
    for (key, value) in params {
        let fits = value.as_u64().is_some_and(|n| u32::try_from(n).is_ok());
        if INTEGER_PARAMETERS.contains(&camel_to_snake_case(key).as_str()) && !fits {
            return Err(ConfigError::NonIntegerParameter {
                collection: collection.to_string(),
                key: key.clone(),
            });
        }
    }
    Ok(())
}

/// `queryBy` → `query_by`. Keys already in snake_case pass through.
pub(crate) fn camel_to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
