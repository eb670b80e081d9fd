//! Explicit process-wide context.
//!
//! The shared resources (rate limiter, response cache, HTTP client, company
//! resolver) live in one `CoreContext` constructed at process start and
//! passed to the engine, instead of hiding in module-level globals. Tests
//! construct isolated contexts over temp directories.

use quarry_data::cache::CacheStats;
use quarry_data::edgar::EdgarClient;
use quarry_data::resolver::CompanyResolver;
use quarry_data::{DataConfig, Result as DataResult};
use std::sync::Arc;

/// Shared resources for the query engine.
#[derive(Debug)]
pub struct CoreContext {
    config: DataConfig,
    client: Arc<EdgarClient>,
    resolver: CompanyResolver,
}

impl CoreContext {
    /// Builds the context: opens the response cache inside the configured
    /// cache directory and wires the client and resolver over it.
    pub fn new(config: DataConfig) -> DataResult<Self> {
        let client = Arc::new(EdgarClient::new(&config)?);
        Ok(Self {
            resolver: CompanyResolver::new(Arc::clone(&client)),
            client,
            config,
        })
    }

    /// The EDGAR client.
    pub fn client(&self) -> &Arc<EdgarClient> {
        &self.client
    }

    /// The company resolver.
    pub const fn resolver(&self) -> &CompanyResolver {
        &self.resolver
    }

    /// The configuration this context was built with.
    pub const fn config(&self) -> &DataConfig {
        &self.config
    }

    /// Empties the response cache.
    pub async fn clear_cache(&self) -> DataResult<()> {
        self.client.cache().clear().await
    }

    /// Deletes expired persistent cache rows; returns the count removed.
    pub fn purge_expired_cache(&self) -> DataResult<usize> {
        self.client.cache().purge_expired()
    }

    /// Persistent cache entry count and size.
    pub fn cache_stats(&self) -> DataResult<CacheStats> {
        self.client.cache().stats()
    }
}
