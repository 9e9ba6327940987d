// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Enhancement
//!
//! Best-effort rewriting of free-text queries by an external service before
//! they reach Typesense. Failures are absorbed: the original text is used.
//!
//! ```text
//! QueryEnhancementCache (single-flight, memoized, timeout-bounded)
//!     ↓
//!     QueryEnhancer ─→ HttpQueryEnhancer → POST {"text": query}
//! ```

mod cache;
mod enhancer;

pub use cache::{EnhancementCacheStats, QueryEnhancementCache};
pub use enhancer::{EnhancementError, HttpQueryEnhancer, NoopEnhancer, QueryEnhancer};
