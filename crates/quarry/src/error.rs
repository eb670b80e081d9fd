//! The closed, caller-facing error taxonomy.

use quarry_data::DataError;
use quarry_data::resolver::CompanyIdentity;
use quarry_xbrl::processor::ConceptAttempt;
use thiserror::Error;

/// Everything a query-engine operation can fail with.
///
/// The set is closed: web layers switch on [`QueryError::kind`] and map to
/// HTTP via [`QueryError::http_status`]. No other error type escapes the
/// engine.
#[derive(Debug, Error)]
pub enum QueryError {
    /// No company matched the query.
    #[error("Company not found: {query}")]
    CompanyNotFound {
        /// The original query string.
        query: String,
    },

    /// Several companies matched the query.
    #[error("Ambiguous company \"{query}\": {} candidates", suggestions.len())]
    CompanyAmbiguous {
        /// The original query string.
        query: String,
        /// Up to five candidate companies.
        suggestions: Vec<CompanyIdentity>,
    },

    /// Unknown metric id.
    #[error("Unknown metric: {id}")]
    MetricNotFound {
        /// The requested id.
        id: String,
        /// Catalog metric ids.
        available: Vec<String>,
    },

    /// Unknown ratio id.
    #[error("Unknown ratio: {id}")]
    RatioNotFound {
        /// The requested id.
        id: String,
        /// Catalog ratio ids.
        available: Vec<String>,
    },

    /// No usable data after trying every candidate concept.
    #[error("No data: {message}")]
    NoData {
        /// What was missing.
        message: String,
        /// Every concept trial, so the caller can see why.
        concepts_tried: Vec<ConceptAttempt>,
    },

    /// EDGAR rate limiting persisted through backoff.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Upstream API failure.
    #[error("EDGAR API error: {0}")]
    Api(String),

    /// The request itself was malformed.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl QueryError {
    /// Stable string discriminator.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CompanyNotFound { .. } => "company_not_found",
            Self::CompanyAmbiguous { .. } => "company_ambiguous",
            Self::MetricNotFound { .. } => "metric_not_found",
            Self::RatioNotFound { .. } => "ratio_not_found",
            Self::NoData { .. } => "no_data",
            Self::RateLimited(_) => "rate_limited",
            Self::Api(_) => "api_error",
            Self::Validation(_) => "validation",
        }
    }

    /// HTTP status a web layer should answer with.
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::CompanyNotFound { .. } | Self::NoData { .. } => 404,
            Self::CompanyAmbiguous { .. }
            | Self::MetricNotFound { .. }
            | Self::RatioNotFound { .. }
            | Self::Validation(_) => 400,
            Self::RateLimited(_) => 429,
            Self::Api(_) => 502,
        }
    }
}

impl From<DataError> for QueryError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::RateLimited { .. } => Self::RateLimited(err.to_string()),
            other => Self::Api(other.to_string()),
        }
    }
}
