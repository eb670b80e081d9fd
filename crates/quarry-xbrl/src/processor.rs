//! Concept selection and fact filtering.
//!
//! A metric declares an ordered list of candidate XBRL tags; which one a
//! company actually uses is a data question, not a catalog question, so
//! selection is data-directed: every candidate is tried against the fact
//! bundle and the one with the freshest usable data wins, with the catalog
//! priority only breaking ties. Along the way the processor rejects
//! cumulative year-to-date values on quarterly queries, dedups competing
//! values for the same period end by filing date (so restatements supersede
//! originals), and re-derives fiscal years from period-end dates.

use crate::catalog::{Aggregation, MetricDefinition, XbrlConcept};
use crate::fact::{DataPoint, FilingSource, FiscalPeriod, SecFact};
use chrono::{Datelike, NaiveDate, Utc};
use quarry_data::edgar::CompanyFacts;
use quarry_data::resolver::CompanyIdentity;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Single-quarter duration window in days. A 10-Q reports both the quarter
/// and the cumulative year-to-date under the same tag; only durations inside
/// this window are true single quarters.
const QUARTER_MIN_DAYS: i64 = 60;
const QUARTER_MAX_DAYS: i64 = 120;

/// Annual or quarterly resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    /// Full fiscal years from 10-K filings.
    Annual,
    /// Single quarters from 10-Q filings (Q4 from the 10-K).
    Quarterly,
}

/// Record of one candidate concept trial.
#[derive(Debug, Clone, Serialize)]
pub struct ConceptAttempt {
    /// Taxonomy of the candidate.
    pub taxonomy: String,
    /// Concept name of the candidate.
    pub concept: String,
    /// Catalog priority (1 = most preferred).
    pub priority: u8,
    /// Whether the company reports anything under this tag and unit.
    pub found: bool,
    /// Usable periods after filtering and dedup.
    pub count: usize,
    /// Greatest fiscal year among the usable periods.
    pub max_fiscal_year: Option<i32>,
}

/// How the concept was chosen, for provenance.
#[derive(Debug, Clone, Serialize)]
pub struct ConceptSelection {
    /// Every candidate tried, in priority order.
    pub concepts_tried: Vec<ConceptAttempt>,
    /// Qualified name of the selected concept, when any had data.
    pub selected: Option<String>,
    /// One-sentence explanation of the choice.
    pub reason: String,
}

/// A period whose winning value superseded an earlier filed value.
#[derive(Debug, Clone, Serialize)]
pub struct Restatement {
    /// Fiscal year of the restated period.
    pub fiscal_year: i32,
    /// Originally filed value.
    pub original_value: f64,
    /// Superseding value.
    pub restated_value: f64,
    /// Percent change from original to restated, one decimal; absent when
    /// the original was zero.
    pub percent_change: Option<f64>,
    /// Filing date of the restating filing.
    pub restated_filed: NaiveDate,
}

/// Output of one extraction: the series plus everything needed to audit it.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Chronologically ascending data points.
    pub data_points: Vec<DataPoint>,
    /// Qualified name of the concept the series came from.
    pub concept: Option<String>,
    /// Trial record.
    pub selection: ConceptSelection,
    /// Restated periods discovered during dedup.
    pub restatements: Vec<Restatement>,
}

impl FetchResult {
    fn empty(selection: ConceptSelection) -> Self {
        Self {
            data_points: Vec::new(),
            concept: None,
            selection,
            restatements: Vec::new(),
        }
    }
}

/// Extracts the most recent `years` annual values for `metric`.
pub fn extract_annual(
    facts: &CompanyFacts,
    company: &CompanyIdentity,
    metric: &MetricDefinition,
    years: usize,
) -> FetchResult {
    extract(facts, company, metric, years, PeriodType::Annual)
}

/// Extracts the most recent `quarters` single-quarter values for `metric`.
pub fn extract_quarterly(
    facts: &CompanyFacts,
    company: &CompanyIdentity,
    metric: &MetricDefinition,
    quarters: usize,
) -> FetchResult {
    extract(facts, company, metric, quarters, PeriodType::Quarterly)
}

struct Candidate<'a> {
    concept: &'a XbrlConcept,
    winners: Vec<SecFact>,
    restatements: Vec<Restatement>,
    max_fiscal_year: Option<i32>,
    latest_end: Option<NaiveDate>,
}

fn extract(
    facts: &CompanyFacts,
    company: &CompanyIdentity,
    metric: &MetricDefinition,
    periods: usize,
    period_type: PeriodType,
) -> FetchResult {
    let unit = metric.unit_code();
    let mut attempts = Vec::with_capacity(metric.concepts.len());
    let mut candidates = Vec::new();

    for concept in metric.concepts {
        let raw = facts.unit_facts(concept.taxonomy, concept.concept, unit);
        let found = raw.is_some_and(|facts| !facts.is_empty());

        let filtered: Vec<SecFact> = raw
            .unwrap_or_default()
            .iter()
            .filter_map(SecFact::from_raw)
            .filter(|fact| match period_type {
                PeriodType::Annual => keep_annual(fact, metric.aggregation),
                PeriodType::Quarterly => keep_quarterly(fact, metric.aggregation),
            })
            .filter(|fact| concept.valid_for(fact.end.year()))
            .collect();

        let (winners, restatements) = dedup_latest_filed(filtered);
        let max_fiscal_year = winners.iter().map(|f| f.end.year()).max();
        let latest_end = winners.iter().map(|f| f.end).max();

        attempts.push(ConceptAttempt {
            taxonomy: concept.taxonomy.to_string(),
            concept: concept.concept.to_string(),
            priority: concept.priority,
            found,
            count: winners.len(),
            max_fiscal_year,
        });

        if !winners.is_empty() {
            candidates.push(Candidate {
                concept,
                winners,
                restatements,
                max_fiscal_year,
                latest_end,
            });
        }
    }

    // Freshness beats catalog preference: companies actively switch tags, so
    // the candidate with the most recent data wins and the priority integer
    // only breaks ties.
    let best = match period_type {
        PeriodType::Annual => candidates.into_iter().max_by(|a, b| {
            a.max_fiscal_year
                .cmp(&b.max_fiscal_year)
                .then_with(|| b.concept.priority.cmp(&a.concept.priority))
        }),
        PeriodType::Quarterly => candidates.into_iter().max_by(|a, b| {
            a.latest_end
                .cmp(&b.latest_end)
                .then_with(|| b.concept.priority.cmp(&a.concept.priority))
        }),
    };

    let Some(best) = best else {
        let reason = format!(
            "no candidate concept had usable {} data under unit {unit}",
            period_label(period_type)
        );
        debug!(metric = metric.id, cik = %company.cik, %reason, "extraction empty");
        return FetchResult::empty(ConceptSelection {
            concepts_tried: attempts,
            selected: None,
            reason,
        });
    };

    let qualified = best.concept.qualified();
    let reason = match period_type {
        PeriodType::Annual => format!(
            "{qualified} selected: freshest annual data (max FY{})",
            best.max_fiscal_year.unwrap_or_default()
        ),
        PeriodType::Quarterly => format!(
            "{qualified} selected: freshest quarterly data (through {})",
            best.latest_end.map(|d| d.to_string()).unwrap_or_default()
        ),
    };
    debug!(metric = metric.id, cik = %company.cik, concept = %qualified, "concept selected");

    let Candidate {
        mut winners,
        restatements,
        ..
    } = best;

    // Most recent `periods` entries, returned chronologically ascending.
    winners.sort_by_key(|f| f.end);
    if winners.len() > periods {
        winners.drain(..winners.len() - periods);
    }

    let extracted_at = Utc::now();
    let data_points = winners
        .into_iter()
        .map(|fact| {
            let fiscal_year = fact.end.year();
            let fiscal_period = match period_type {
                PeriodType::Annual => FiscalPeriod::FY,
                PeriodType::Quarterly => FiscalPeriod::from_end_date(fact.end),
            };
            let checksum = DataPoint::compute_checksum(
                &company.cik,
                metric.id,
                fiscal_year,
                fiscal_period,
                fact.value,
                &fact.accession,
            );
            DataPoint {
                metric_id: metric.id.to_string(),
                cik: company.cik.clone(),
                company_name: company.name.clone(),
                fiscal_year,
                fiscal_period,
                period_start: fact.start,
                period_end: fact.end,
                value: fact.value,
                unit: unit.to_string(),
                source: FilingSource {
                    accession: fact.accession,
                    filing_date: fact.filed,
                    form: fact.form,
                    xbrl_concept: qualified.clone(),
                },
                restated_in: None,
                is_latest: true,
                extracted_at,
                checksum,
            }
        })
        .collect();

    FetchResult {
        data_points,
        concept: Some(qualified.clone()),
        selection: ConceptSelection {
            concepts_tried: attempts,
            selected: Some(qualified),
            reason,
        },
        restatements,
    }
}

/// Annual filter: 10-K family forms, a nonzero SEC fiscal year, and the
/// fiscal-period label matching the aggregation. Snapshots accept Q4 as well
/// as FY since both mark the year-end balance sheet.
fn keep_annual(fact: &SecFact, aggregation: Aggregation) -> bool {
    if !fact.form.starts_with("10-K") {
        return false;
    }
    if !fact.fy.is_some_and(|fy| fy != 0) {
        return false;
    }
    match aggregation {
        Aggregation::Sum | Aggregation::Average => fact.fp == Some(FiscalPeriod::FY),
        Aggregation::EndOfPeriod => {
            matches!(fact.fp, Some(FiscalPeriod::FY) | Some(FiscalPeriod::Q4))
        }
    }
}

/// Quarterly filter: 10-Q or 10-K family forms (Q4 lives in the 10-K), a
/// quarterly fiscal-period label, and for duration metrics a period length
/// inside the single-quarter window; this is what rejects cumulative
/// year-to-date values filed under the same tag.
fn keep_quarterly(fact: &SecFact, aggregation: Aggregation) -> bool {
    if !(fact.form.starts_with("10-Q") || fact.form.starts_with("10-K")) {
        return false;
    }
    if !fact.fp.is_some_and(|fp| fp.is_quarter()) {
        return false;
    }
    match aggregation {
        Aggregation::Sum | Aggregation::Average => fact
            .duration_days()
            .is_some_and(|days| (QUARTER_MIN_DAYS..=QUARTER_MAX_DAYS).contains(&days)),
        Aggregation::EndOfPeriod => true,
    }
}

/// Groups facts by period end and keeps the latest-filed value per group:
/// "most recently filed wins", which is exactly how restatements supersede
/// originals. Also reports each superseded period as a [`Restatement`].
fn dedup_latest_filed(facts: Vec<SecFact>) -> (Vec<SecFact>, Vec<Restatement>) {
    let mut by_end: BTreeMap<NaiveDate, Vec<SecFact>> = BTreeMap::new();
    for fact in facts {
        by_end.entry(fact.end).or_default().push(fact);
    }

    let mut winners = Vec::with_capacity(by_end.len());
    let mut restatements = Vec::new();

    for (end, mut group) in by_end {
        group.sort_by(|a, b| {
            a.filed
                .cmp(&b.filed)
                .then_with(|| a.accession.cmp(&b.accession))
        });
        let winner = group.pop().expect("group is never empty");

        // The earliest differing value is the "original" a reader would have
        // seen before the restatement.
        if let Some(original) = group
            .iter()
            .find(|f| (f.value - winner.value).abs() > f64::EPSILON)
        {
            restatements.push(Restatement {
                fiscal_year: end.year(),
                original_value: original.value,
                restated_value: winner.value,
                percent_change: percent_change(original.value, winner.value),
                restated_filed: winner.filed,
            });
        }

        winners.push(winner);
    }

    (winners, restatements)
}

fn percent_change(original: f64, restated: f64) -> Option<f64> {
    if original == 0.0 {
        return None;
    }
    let change = (restated - original) / original.abs();
    Some((change * 1000.0).round() / 10.0)
}

const fn period_label(period_type: PeriodType) -> &'static str {
    match period_type {
        PeriodType::Annual => "annual",
        PeriodType::Quarterly => "quarterly",
    }
}
