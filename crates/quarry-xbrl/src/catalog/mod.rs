//! Static metric and ratio definitions.
//!
//! Companies do not all use the same XBRL tag for the same economic
//! quantity, and the taxonomy evolves, so every metric declares an ordered
//! list of candidate concepts. The processor tries them data-directed; the
//! priority here is only a tiebreak.

mod metrics;
mod ratios;

pub use metrics::{
    Aggregation, MetricDefinition, StatementType, UnitType, XbrlConcept, metric_by_id, metrics,
};
pub use ratios::{RatioDefinition, RatioFormat, RatioOperation, ratio_by_id, ratios};
