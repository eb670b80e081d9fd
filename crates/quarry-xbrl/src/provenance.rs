//! Auditable provenance for resolved series.
//!
//! Every number the engine returns can be traced back to the filings and
//! concepts that produced it: which tags were tried, which was selected,
//! which periods were restated, and how competing values were deduplicated.

use crate::catalog::{Aggregation, MetricDefinition};
use crate::fact::DataPoint;
use crate::processor::{ConceptSelection, Restatement};
use chrono::NaiveDate;
use serde::Serialize;

/// The constant dedup rule the processor applies.
pub const DEDUP_STRATEGY: &str =
    "Most recently filed values selected (grouped by period end date)";

/// One filing that contributed values to a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilingUsed {
    /// Accession number.
    pub accession: String,
    /// Form type.
    pub form: String,
    /// Date the filing was made.
    pub filing_date: NaiveDate,
    /// Fiscal year the filing contributed.
    pub fiscal_year: i32,
}

/// Human-readable audit record for one resolved series.
#[derive(Debug, Clone, Serialize)]
pub struct Provenance {
    /// Qualified concept the values came from, when any candidate had data.
    pub concept: Option<String>,
    /// Dedup rule description.
    pub dedup_strategy: String,
    /// Period-type label.
    pub period_type: String,
    /// Contributing filings, fiscal-year ascending.
    pub filings: Vec<FilingUsed>,
    /// Free-form notes: restatements, aggregation semantics, concepts not
    /// found, alternatives not selected.
    pub notes: Vec<String>,
}

/// Builds the provenance record for one extraction.
pub fn build_provenance(
    data_points: &[DataPoint],
    selection: &ConceptSelection,
    restatements: &[Restatement],
    metric: &MetricDefinition,
) -> Provenance {
    let quarterly = data_points.iter().any(|p| p.fiscal_period.is_quarter());
    let period_type = if quarterly {
        "Quarterly (single quarter)"
    } else {
        "Annual (full fiscal year)"
    };

    let mut filings: Vec<FilingUsed> = Vec::new();
    for point in data_points {
        if filings.iter().any(|f| f.accession == point.source.accession) {
            continue;
        }
        filings.push(FilingUsed {
            accession: point.source.accession.clone(),
            form: point.source.form.clone(),
            filing_date: point.source.filing_date,
            fiscal_year: point.fiscal_year,
        });
    }
    filings.sort_by_key(|f| f.fiscal_year);

    let mut notes = Vec::new();

    for restatement in restatements {
        notes.push(format!(
            "FY{} was restated: original {} → {} ({}) in filing {}",
            restatement.fiscal_year,
            format_money(restatement.original_value),
            format_money(restatement.restated_value),
            restatement
                .percent_change
                .map_or_else(|| "n/a".to_string(), format_signed_percent),
            restatement.restated_filed,
        ));
    }

    if !data_points.is_empty() {
        notes.push(match (metric.aggregation, quarterly) {
            (Aggregation::EndOfPeriod, _) => "Values are end-of-period snapshots".to_string(),
            (_, true) => "Values are single-quarter amounts".to_string(),
            (_, false) => "Values are cumulative for the full fiscal year".to_string(),
        });
    }

    for attempt in &selection.concepts_tried {
        let qualified = format!("{}:{}", attempt.taxonomy, attempt.concept);
        if Some(&qualified) == selection.selected.as_ref() {
            continue;
        }
        if !attempt.found {
            notes.push(format!("Concept {qualified} not found in company filings"));
        } else if attempt.count > 0 {
            notes.push(format!(
                "Alternative concept {}:{} (max FY{}) had data but was not selected",
                attempt.taxonomy,
                attempt.concept,
                attempt.max_fiscal_year.unwrap_or_default(),
            ));
        }
    }

    Provenance {
        concept: selection.selected.clone(),
        dedup_strategy: DEDUP_STRATEGY.to_string(),
        period_type: period_type.to_string(),
        filings,
        notes,
    }
}

fn format_money(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("${value:.0}")
    } else {
        format!("${value:.2}")
    }
}

fn format_signed_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:+.0}%")
    } else {
        format!("{value:+.1}%")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::metric_by_id;
    use crate::fact::{FilingSource, FiscalPeriod};
    use crate::processor::ConceptAttempt;
    use chrono::Utc;

    fn point(fiscal_year: i32, accession: &str) -> DataPoint {
        let period_end = NaiveDate::from_ymd_opt(fiscal_year, 12, 31).unwrap();
        DataPoint {
            metric_id: "revenue".to_string(),
            cik: "320193".to_string(),
            company_name: "Apple Inc.".to_string(),
            fiscal_year,
            fiscal_period: FiscalPeriod::FY,
            period_start: NaiveDate::from_ymd_opt(fiscal_year, 1, 1),
            period_end,
            value: 100.0,
            unit: "USD".to_string(),
            source: FilingSource {
                accession: accession.to_string(),
                filing_date: NaiveDate::from_ymd_opt(fiscal_year + 1, 2, 15).unwrap(),
                form: "10-K".to_string(),
                xbrl_concept: "us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax"
                    .to_string(),
            },
            restated_in: None,
            is_latest: true,
            extracted_at: Utc::now(),
            checksum: String::new(),
        }
    }

    fn selection() -> ConceptSelection {
        ConceptSelection {
            concepts_tried: vec![
                ConceptAttempt {
                    taxonomy: "us-gaap".to_string(),
                    concept: "Revenues".to_string(),
                    priority: 1,
                    found: true,
                    count: 2,
                    max_fiscal_year: Some(2018),
                },
                ConceptAttempt {
                    taxonomy: "us-gaap".to_string(),
                    concept: "RevenueFromContractWithCustomerExcludingAssessedTax".to_string(),
                    priority: 2,
                    found: true,
                    count: 5,
                    max_fiscal_year: Some(2024),
                },
                ConceptAttempt {
                    taxonomy: "us-gaap".to_string(),
                    concept: "SalesRevenueNet".to_string(),
                    priority: 3,
                    found: false,
                    count: 0,
                    max_fiscal_year: None,
                },
            ],
            selected: Some(
                "us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax".to_string(),
            ),
            reason: "freshest annual data".to_string(),
        }
    }

    #[test]
    fn test_filings_sorted_and_deduped() {
        let points = vec![point(2024, "accn-24"), point(2023, "accn-23"), point(2022, "accn-23")];
        let metric = metric_by_id("revenue").unwrap();
        let provenance = build_provenance(&points, &selection(), &[], metric);

        assert_eq!(provenance.filings.len(), 2);
        assert_eq!(provenance.filings[0].fiscal_year, 2022);
        assert_eq!(provenance.filings[1].fiscal_year, 2024);
        assert_eq!(provenance.dedup_strategy, DEDUP_STRATEGY);
        assert_eq!(provenance.period_type, "Annual (full fiscal year)");
    }

    #[test]
    fn test_restatement_note_format() {
        let restatement = Restatement {
            fiscal_year: 2022,
            original_value: 100.0,
            restated_value: 105.0,
            percent_change: Some(5.0),
            restated_filed: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
        };
        let metric = metric_by_id("net_income").unwrap();
        let provenance = build_provenance(&[point(2022, "accn-B")], &selection(), &[restatement], metric);

        assert!(provenance.notes.iter().any(|n| n
            == "FY2022 was restated: original $100 → $105 (+5%) in filing 2024-02-10"));
    }

    #[test]
    fn test_alternative_and_missing_concept_notes() {
        let metric = metric_by_id("revenue").unwrap();
        let provenance = build_provenance(&[point(2024, "accn-24")], &selection(), &[], metric);

        assert!(
            provenance
                .notes
                .iter()
                .any(|n| n.contains("Revenues (max FY2018)"))
        );
        assert!(
            provenance
                .notes
                .iter()
                .any(|n| n.contains("us-gaap:SalesRevenueNet not found"))
        );
    }

    #[test]
    fn test_aggregation_notes() {
        let metric = metric_by_id("total_assets").unwrap();
        let provenance = build_provenance(&[point(2024, "a")], &selection(), &[], metric);
        assert!(
            provenance
                .notes
                .contains(&"Values are end-of-period snapshots".to_string())
        );

        let revenue = metric_by_id("revenue").unwrap();
        let provenance = build_provenance(&[point(2024, "a")], &selection(), &[], revenue);
        assert!(
            provenance
                .notes
                .contains(&"Values are cumulative for the full fiscal year".to_string())
        );
    }

    #[test]
    fn test_quarterly_period_label() {
        let mut quarterly_point = point(2024, "a");
        quarterly_point.fiscal_period = FiscalPeriod::Q3;
        let metric = metric_by_id("revenue").unwrap();
        let provenance = build_provenance(&[quarterly_point], &selection(), &[], metric);
        assert_eq!(provenance.period_type, "Quarterly (single quarter)");
        assert!(
            provenance
                .notes
                .contains(&"Values are single-quarter amounts".to_string())
        );
    }
}
