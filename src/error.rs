// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types surfaced by the adapter.
//!
//! Enhancement failures never show up here: they are absorbed by the
//! [`QueryEnhancementCache`](crate::enhancement::QueryEnhancementCache)
//! and degrade to the original query text.

use thiserror::Error;

use crate::config::ConfigError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AdapterError>;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("invalid geo filter: {0}")]
    InvalidGeoFilter(String),

    #[error("invalid numeric filter '{filter}': {reason}")]
    InvalidNumericFilter { filter: String, reason: String },

    #[error("invalid facet filter '{filter}': {reason}")]
    InvalidFacetFilter { filter: String, reason: String },

    /// A `/sort/<spec>` suffix that no sort registry knows about
    #[error("sort option '{spec}' is not configured for collection '{collection}'")]
    UnknownSortOption { collection: String, spec: String },

    /// Per-result error reported by the search engine
    #[error("{code} - {message}")]
    Engine { code: String, message: String },

    /// A result carrying neither `hits` nor `grouped_hits`
    #[error("Did not find any hits. {code} - {message}")]
    MissingHits { code: String, message: String },

    #[error("search client error: {0}")]
    Client(String),
}

impl AdapterError {
    pub(crate) fn numeric(filter: &str, reason: impl Into<String>) -> Self {
        Self::InvalidNumericFilter {
            filter: filter.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn facet(filter: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFacetFilter {
            filter: filter.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error was raised before any network call was made.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidGeoFilter(_)
                | Self::InvalidNumericFilter { .. }
                | Self::InvalidFacetFilter { .. }
                | Self::UnknownSortOption { .. }
                | Self::InvalidConfig(_)
        )
    }
}
