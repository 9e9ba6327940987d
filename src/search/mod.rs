// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Translation
//!
//! InstantSearch parameters in, Typesense multi-search parameters out.
//!
//! # Architecture
//!
//! ```text
//! SearchRequest
//!     ↓
//!     ├─→ SortResolver     → collection + sort_by (from "coll/sort/<spec>")
//!     ├─→ FilterTranslator → filter_by (facet && numeric && geo), facet_by
//!     │        ↓
//!     │        FieldTokenizer (special-character field names)
//!     ↓
//! NativeSearchParameters → MultiSearchRequest
//! ```
//!
//! # Filter Language (Typesense syntax)
//!
//! ```text
//! brand:=[`Nike`,`Adidas`]      - Exact match, any of
//! brand:!=[`Puma`]              - Exact exclusion
//! price:=[10..20]               - Inclusive range
//! rating:>=4                    - Numeric bound
//! _geoloc:(1,2, 10 km)          - Radius around point
//! a && b                        - Boolean AND
//! (a || b)                      - Boolean OR
//! ```

mod field_tokenizer;
mod filter_translator;
mod native_params;
mod sort_resolver;

pub use field_tokenizer::{FacetToken, FieldTokenizer, NumericOperator, NumericToken};
pub use filter_translator::FilterTranslator;
pub use native_params::{MultiSearchRequest, MultiSearchResponse, NativeResult, NativeSearchParameters};
pub use sort_resolver::{ResolvedIndex, SortDirective, SortResolver};
