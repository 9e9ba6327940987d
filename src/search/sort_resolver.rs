// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Sort Resolver
//!
//! InstantSearch encodes sorting in the index name (one "replica" per sort
//! order). We accept `collection/sort/<spec>` and look `<spec>` up in the
//! configured sort registries:
//!
//! ```text
//! "products"                    → collection "products", no sort_by
//! "products/sort/price:asc"     → collection "products", sort_by "price:asc"
//!                                  + flags from the registry entry
//! ```

use serde_json::{Map, Value};

use crate::config::AdapterConfig;
use crate::error::{AdapterError, Result};

const SORT_SEPARATOR: &str = "/sort/";

/// A registered sort spec and the flags that travel with it.
#[derive(Debug, Clone, PartialEq)]
pub struct SortDirective {
    pub sort_by: String,
    pub enable_overrides: Option<bool>,
    pub extra: Map<String, Value>,
}

/// Collection and optional sort directive decoded from an index name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIndex {
    pub collection: String,
    pub sort: Option<SortDirective>,
}

pub struct SortResolver<'a> {
    config: &'a AdapterConfig,
}

impl<'a> SortResolver<'a> {
    pub fn new(config: &'a AdapterConfig) -> Self {
        Self { config }
    }

    /// Split an index name into collection and raw sort spec.
    pub fn split_index_name(index_name: &str) -> (&str, Option<&str>) {
        match index_name.split_once(SORT_SEPARATOR) {
            Some((collection, spec)) if !collection.is_empty() => (collection, Some(spec)),
            _ => (index_name, None),
        }
    }

    pub fn collection_name(index_name: &str) -> &str {
        Self::split_index_name(index_name).0
    }

    /// Resolve an index name against the sort registries.
    ///
    /// An unregistered spec fails with [`AdapterError::UnknownSortOption`].
    pub fn resolve(&self, index_name: &str) -> Result<ResolvedIndex> {
        let (collection, spec) = Self::split_index_name(index_name);

        let sort = match spec {
            None => None,
            Some(spec) => {
                let option = self.config.sort_option(collection, spec).ok_or_else(|| {
                    AdapterError::UnknownSortOption {
                        collection: collection.to_string(),
                        spec: spec.to_string(),
                    }
                })?;
                Some(SortDirective {
                    sort_by: spec.to_string(),
                    enable_overrides: option.enable_overrides,
                    extra: option.extra.clone(),
                })
            }
        };

        Ok(ResolvedIndex {
            collection: collection.to_string(),
            sort,
        })
    }
}
