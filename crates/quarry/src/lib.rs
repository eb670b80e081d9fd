#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/quarry/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod engine;
pub mod error;
pub mod outcome;

// Re-export the layers below for single-crate consumers
pub use quarry_data as data;
pub use quarry_xbrl as xbrl;
pub use quarry_xbrl::processor;

pub use context::CoreContext;
pub use engine::{QueryEngine, ScreenSort};
pub use error::QueryError;
pub use outcome::{
    CompareOutcome, MatrixOutcome, MultiMetricOutcome, QueryOutcome, RatioOutcome, ScreenOutcome,
    SummaryOutcome,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
