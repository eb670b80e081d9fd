#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/quarry/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod calc;
pub mod catalog;
pub mod fact;
pub mod processor;
pub mod provenance;

pub use catalog::{MetricDefinition, RatioDefinition};
pub use fact::{DataPoint, FilingSource, FiscalPeriod};
pub use processor::{ConceptAttempt, ConceptSelection, FetchResult, Restatement};
pub use provenance::Provenance;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
