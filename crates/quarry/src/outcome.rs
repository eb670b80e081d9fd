//! JSON-stable result shapes.
//!
//! Every public result carries the resolved company, the metric or ratio it
//! answers for, a data array, and provenance. Field names are snake_case,
//! dates are ISO-8601, and CIKs are unpadded decimal strings.

use quarry_data::resolver::CompanyIdentity;
use quarry_xbrl::calc::{RatioPoint, SeriesCalculations};
use quarry_xbrl::catalog::{
    MetricDefinition, RatioDefinition, RatioFormat, RatioOperation, UnitType,
};
use quarry_xbrl::fact::DataPoint;
use quarry_xbrl::provenance::Provenance;
use serde::Serialize;
use std::collections::BTreeMap;

/// Metric header carried by results.
#[derive(Debug, Clone, Serialize)]
pub struct MetricRef {
    /// Metric id.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Unit family.
    pub unit_type: UnitType,
}

impl From<&MetricDefinition> for MetricRef {
    fn from(metric: &MetricDefinition) -> Self {
        Self {
            id: metric.id.to_string(),
            display_name: metric.display_name.to_string(),
            unit_type: metric.unit_type,
        }
    }
}

/// Ratio header carried by results.
#[derive(Debug, Clone, Serialize)]
pub struct RatioRef {
    /// Ratio id.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Output format.
    pub format: RatioFormat,
    /// Combining operation.
    pub operation: RatioOperation,
}

impl From<&RatioDefinition> for RatioRef {
    fn from(ratio: &RatioDefinition) -> Self {
        Self {
            id: ratio.id.to_string(),
            display_name: ratio.display_name.to_string(),
            format: ratio.format,
            operation: ratio.operation,
        }
    }
}

/// Result of [`crate::QueryEngine::query`].
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    /// Resolved company.
    pub company: CompanyIdentity,
    /// Queried metric.
    pub metric: MetricRef,
    /// Chronologically ascending series.
    pub data: Vec<DataPoint>,
    /// Derived calculations over the series.
    pub calculations: SeriesCalculations,
    /// Audit record.
    pub provenance: Provenance,
}

/// A per-ticker failure inside a batch operation.
#[derive(Debug, Clone, Serialize)]
pub struct TickerError {
    /// The ticker or query that failed.
    pub ticker: String,
    /// Stable error discriminator.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

/// Result of [`crate::QueryEngine::compare`].
#[derive(Debug, Clone, Serialize)]
pub struct CompareOutcome {
    /// Queried metric.
    pub metric: MetricRef,
    /// Per-company results that succeeded.
    pub results: Vec<QueryOutcome>,
    /// Per-company failures; one failure never aborts the others.
    pub errors: Vec<TickerError>,
}

/// Provenance for both legs of a ratio.
#[derive(Debug, Clone, Serialize)]
pub struct RatioProvenance {
    /// Numerator audit record.
    pub numerator: Provenance,
    /// Denominator audit record.
    pub denominator: Provenance,
}

/// Result of [`crate::QueryEngine::ratio`].
#[derive(Debug, Clone, Serialize)]
pub struct RatioOutcome {
    /// Resolved company.
    pub company: CompanyIdentity,
    /// Queried ratio.
    pub ratio: RatioRef,
    /// Composed values, fiscal-year ascending.
    pub data: Vec<RatioPoint>,
    /// Years skipped because the denominator was zero.
    pub div_by_zero_count: usize,
    /// Audit records for both component metrics.
    pub provenance: RatioProvenance,
}

/// One metric line of a summary.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryMetric {
    /// Metric id.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Unit family.
    pub unit_type: UnitType,
    /// Value for the summary fiscal year.
    pub value: f64,
    /// YoY change into the summary year, when computable.
    pub yoy_change: Option<f64>,
}

/// One ratio line of a summary.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRatio {
    /// Ratio id.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Output format.
    pub format: RatioFormat,
    /// Composed value for the summary fiscal year.
    pub value: f64,
}

/// Result of [`crate::QueryEngine::summary`].
#[derive(Debug, Clone, Serialize)]
pub struct SummaryOutcome {
    /// Resolved company.
    pub company: CompanyIdentity,
    /// The fiscal year summarized.
    pub fiscal_year: i32,
    /// Catalog metrics with data for that year.
    pub metrics: Vec<SummaryMetric>,
    /// Derived ratios; skipped when an operand is missing or the denominator
    /// is zero.
    pub ratios: Vec<SummaryRatio>,
}

/// One metric's aligned values in a multi-metric result.
#[derive(Debug, Clone, Serialize)]
pub struct MetricSeries {
    /// Metric id.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// fiscal year -> value.
    pub values: BTreeMap<i32, f64>,
}

/// Result of [`crate::QueryEngine::multi_metric`].
#[derive(Debug, Clone, Serialize)]
pub struct MultiMetricOutcome {
    /// Resolved company.
    pub company: CompanyIdentity,
    /// Union of fiscal years across the metrics, ascending.
    pub years: Vec<i32>,
    /// Aligned per-metric values.
    pub metrics: Vec<MetricSeries>,
}

/// One company column of a matrix.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixColumn {
    /// The company.
    pub company: CompanyIdentity,
    /// Values aligned to the matrix metric order; absent when the company
    /// has no value for the shared year.
    pub values: Vec<Option<f64>>,
}

/// Result of [`crate::QueryEngine::matrix`].
#[derive(Debug, Clone, Serialize)]
pub struct MatrixOutcome {
    /// The shared fiscal year.
    pub fiscal_year: i32,
    /// Metric order for the columns.
    pub metrics: Vec<MetricRef>,
    /// Per-company columns.
    pub companies: Vec<MatrixColumn>,
    /// Per-ticker failures.
    pub errors: Vec<TickerError>,
}

/// One entry of a screen ranking.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenEntry {
    /// CIK, unpadded.
    pub cik: String,
    /// Registrant legal name.
    pub name: String,
    /// Value for the screened period.
    pub value: f64,
}

/// Result of [`crate::QueryEngine::screen`].
#[derive(Debug, Clone, Serialize)]
pub struct ScreenOutcome {
    /// Screened metric.
    pub metric: MetricRef,
    /// Calendar year screened.
    pub fiscal_year: i32,
    /// Qualified concept that produced the frame.
    pub concept: String,
    /// Matches after filtering, before the limit.
    pub total_matches: usize,
    /// Ranked entries, at most `limit`.
    pub entries: Vec<ScreenEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_xbrl::catalog::{metric_by_id, ratio_by_id};

    #[test]
    fn test_metric_ref_serializes_snake_case() {
        let metric = MetricRef::from(metric_by_id("revenue").unwrap());
        let json = serde_json::to_value(&metric).unwrap();
        assert_eq!(json["id"], "revenue");
        assert_eq!(json["display_name"], "Revenue");
        assert_eq!(json["unit_type"], "currency");
    }

    #[test]
    fn test_ratio_ref_serialization() {
        let ratio = RatioRef::from(ratio_by_id("net_margin").unwrap());
        let json = serde_json::to_value(&ratio).unwrap();
        assert_eq!(json["format"], "percentage");
        assert_eq!(json["operation"], "divide");
    }
}
