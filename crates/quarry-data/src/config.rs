//! Configuration for the fetch layer.

use std::path::PathBuf;

/// Environment variable that overrides the outbound User-Agent.
///
/// The SEC fair-access policy requires every request to identify its sender;
/// deployments should set this to "Company Name contact@example.com".
pub const USER_AGENT_ENV: &str = "EDGAR_USER_AGENT";

/// Fallback User-Agent when the environment variable is unset.
const DEFAULT_USER_AGENT: &str = "quarry/0.1 (quarry@factordynamics.io)";

/// Maximum requests per second against EDGAR (SEC fair-access limit).
pub const EDGAR_MAX_REQUESTS_PER_SECOND: u32 = 10;

/// Cache TTLs by URL class, in hours.
pub mod ttl {
    /// Company facts bundles change at most once per filing cycle.
    pub const COMPANY_FACTS_HOURS: u64 = 168;
    /// Submission histories pick up new filings daily.
    pub const SUBMISSIONS_HOURS: u64 = 24;
    /// Frames snapshots for recent periods are refreshed as filings arrive.
    pub const FRAMES_HOURS: u64 = 24;
    /// The ticker table changes rarely.
    pub const COMPANY_TICKERS_HOURS: u64 = 168;
    /// Filed documents are immutable once accepted.
    pub const FILING_DOCUMENTS_HOURS: u64 = 720;
    /// Full-text search results.
    pub const SEARCH_HOURS: u64 = 24;
    /// Single-concept fact histories follow the facts bundle cadence.
    pub const COMPANY_CONCEPT_HOURS: u64 = 24;
}

/// Configuration for the fetch layer.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// User-Agent sent with every EDGAR request.
    pub user_agent: String,
    /// Directory holding the persistent response cache.
    pub cache_dir: PathBuf,
    /// Capacity of the in-memory cache front.
    pub memory_cache_capacity: usize,
    /// Maximum requests per second.
    pub requests_per_second: u32,
    /// Scheme-and-host prefix substituted for `https://` in every request
    /// URL. The default leaves URLs untouched; tests and proxies point it at
    /// another server, e.g. `http://127.0.0.1:9000/`.
    pub base_url: String,
}

impl DataConfig {
    /// Builds a configuration from the environment.
    ///
    /// Reads [`USER_AGENT_ENV`] for the User-Agent and defaults the cache
    /// directory to `~/.quarry/cache`.
    pub fn from_env() -> Self {
        let user_agent = std::env::var(USER_AGENT_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let cache_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".quarry")
            .join("cache");

        Self {
            user_agent,
            cache_dir,
            memory_cache_capacity: 100,
            requests_per_second: EDGAR_MAX_REQUESTS_PER_SECOND,
            base_url: "https://".to_string(),
        }
    }

    /// Rewrites an `https://` URL onto the configured base.
    ///
    /// # Example
    ///
    /// ```
    /// use quarry_data::DataConfig;
    ///
    /// let mut config = DataConfig::from_env();
    /// config.base_url = "http://127.0.0.1:9000/".to_string();
    /// assert_eq!(
    ///     config.build_url("https://data.sec.gov/submissions/CIK0000320193.json"),
    ///     "http://127.0.0.1:9000/data.sec.gov/submissions/CIK0000320193.json"
    /// );
    /// ```
    pub fn build_url(&self, url: &str) -> String {
        url.strip_prefix("https://")
            .map_or_else(|| url.to_string(), |rest| format!("{}{rest}", self.base_url))
    }

    /// Overrides the cache directory. Tests point this at a temp dir so
    /// parallel runs never share a database file.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Overrides the User-Agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Overrides the base URL (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = DataConfig::from_env()
            .with_cache_dir("/tmp/quarry-test")
            .with_user_agent("Test Suite test@example.com");
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/quarry-test"));
        assert_eq!(config.user_agent, "Test Suite test@example.com");
        assert_eq!(config.requests_per_second, 10);
        assert_eq!(config.memory_cache_capacity, 100);
    }
}
