//! # Typesense InstantSearch Adapter
//!
//! Lets an InstantSearch UI talk to a Typesense server: UI search requests
//! are translated into Typesense multi-search parameters and sent in one
//! batched call.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  InstantSearchAdapter                       │
//! │  • search / search_for_facet_values                        │
//! │  • clear_cache / update_configuration                      │
//! │  • per-result validation of the Typesense response         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  QueryEnhancementCache                      │
//! │  • optional rewrite of free-text queries by an HTTP service │
//! │  • memoized, single-flight, timeout-bounded                 │
//! │  • failures degrade to the original query                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RequestAdapter                          │
//! │  • SortResolver: "collection/sort/<spec>" → sort_by         │
//! │  • FilterTranslator: facet, numeric, geo → filter_by        │
//! │  • one POST /multi_search, results in request order         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use typesense_instantsearch_adapter::{AdapterConfig, InstantSearchAdapter, SearchRequest};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AdapterConfig::from_value(json!({
//!         "server": {
//!             "apiKey": "xyz",
//!             "nodes": [{ "host": "localhost", "port": 8108, "protocol": "http" }]
//!         },
//!         "additionalSearchParameters": { "queryBy": "name,description" },
//!         "queryEnhancement": { "enabled": true, "url": "http://localhost:8000/enhance", "timeout": 2000 }
//!     }))
//!     .expect("Invalid configuration");
//!
//!     let adapter = InstantSearchAdapter::new(config).expect("Failed to create adapter");
//!
//!     let requests: Vec<SearchRequest> = serde_json::from_value(json!([{
//!         "indexName": "products/sort/price:asc",
//!         "params": { "query": "running shoes", "facetFilters": [["brand:Nike"]], "page": 0 }
//!     }]))
//!     .unwrap();
//!
//!     let response = adapter.search(&requests).await.expect("Search failed");
//!     println!("{} results", response.results.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`coordinator`]: [`InstantSearchAdapter`] and the per-batch [`RequestAdapter`]
//! - [`search`]: filter and sort translation, Typesense wire types
//! - [`enhancement`]: query enhancement client and cache
//! - [`client`]: outbound client traits and reqwest implementations
//! - [`config`]: adapter options
//! - [`metrics`]: `metrics` crate instrumentation

pub mod client;
pub mod config;
pub mod coordinator;
pub mod enhancement;
pub mod error;
pub mod metrics;
pub mod request;
pub mod search;

pub use client::{Connector, HttpConnector, SearchClient, TypesenseClient};
pub use config::{AdapterConfig, ConfigError, FieldFilterConfig, NodeConfig, QueryEnhancementConfig, ServerConfig, SortOption};
pub use coordinator::{InstantSearchAdapter, RequestAdapter};
pub use enhancement::{EnhancementCacheStats, EnhancementError, HttpQueryEnhancer, NoopEnhancer, QueryEnhancementCache, QueryEnhancer};
pub use error::{AdapterError, Result};
pub use metrics::LatencyTimer;
pub use request::{AroundRadius, Coordinate, FacetFilter, GeoCoordinates, SearchParams, SearchRequest, MATCH_ALL};
pub use search::{FilterTranslator, MultiSearchRequest, MultiSearchResponse, NativeResult, NativeSearchParameters, SortResolver};
