//! Error types for the fetch layer.

use thiserror::Error;

/// Result type for fetch-layer operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while fetching or caching EDGAR data.
#[derive(Debug, Error)]
pub enum DataError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Non-success HTTP status that is not retryable
    #[error("EDGAR returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Resource does not exist on EDGAR (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// EDGAR rejected the request (HTTP 403). Almost always a missing or
    /// non-compliant User-Agent header.
    #[error(
        "EDGAR refused the request (403). Set the EDGAR_USER_AGENT environment \
         variable to a contact string such as \"Company Name name@example.com\""
    )]
    Forbidden,

    /// Rate limited by EDGAR even after backoff (HTTP 429)
    #[error("Rate limited by EDGAR after {attempts} attempts")]
    RateLimited {
        /// Number of attempts made before giving up
        attempts: u32,
    },

    /// Cache error
    #[error("Cache error: {0}")]
    Cache(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CIK not found for a ticker or company name
    #[error("CIK not found for: {0}")]
    CikNotFound(String),

    /// Invalid ticker, CIK, or other identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl DataError {
    /// Returns true if the error may succeed on retry (429, 5xx, network).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::RateLimited { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Creates a parse error with a remediation hint appended.
    pub fn parse_with_hint(msg: impl std::fmt::Display, hint: &str) -> Self {
        Self::Parse(format!("{msg} ({hint})"))
    }
}
