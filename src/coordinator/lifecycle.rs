// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Adapter lifecycle: cache clearing and configuration reloads.

use tracing::info;

use crate::config::AdapterConfig;
use crate::error::Result;
use crate::metrics;

use super::InstantSearchAdapter;

impl InstantSearchAdapter {
    /// Reconnect the search client and forget every enhancement.
    ///
    /// Batches already running keep the client and cache they started with.
    pub fn clear_cache(&self) -> Result<()> {
        let mut state = self.state.write();
        state.client = self.connector.search_client(&state.config.server)?;
        state.cache.clear();
        drop(state);

        metrics::record_reset("clear_cache");
        info!("Search client reconnected and enhancement cache cleared");
        Ok(())
    }

    /// Validate and swap in a new configuration.
    ///
    /// On error the running configuration is left untouched.
    pub fn update_configuration(&self, config: AdapterConfig) -> Result<()> {
        config.validate()?;
        let next = Self::connect(self.connector.as_ref(), config)?;
        let enhancement = next.cache.is_enabled();

        let previous = std::mem::replace(&mut *self.state.write(), next);
        previous.cache.clear();

        metrics::record_reset("update_configuration");
        info!(enhancement, "Adapter configuration updated");
        Ok(())
    }
}
