//! Normalized facts and data points.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use quarry_data::edgar::RawFact;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fmt::Write as _;

/// Fiscal period label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FiscalPeriod {
    /// Full fiscal year.
    FY,
    /// First fiscal quarter.
    Q1,
    /// Second fiscal quarter.
    Q2,
    /// Third fiscal quarter.
    Q3,
    /// Fourth fiscal quarter.
    Q4,
}

impl FiscalPeriod {
    /// Parses the SEC `fp` field.
    pub fn parse(fp: &str) -> Option<Self> {
        match fp {
            "FY" => Some(Self::FY),
            "Q1" => Some(Self::Q1),
            "Q2" => Some(Self::Q2),
            "Q3" => Some(Self::Q3),
            "Q4" => Some(Self::Q4),
            _ => None,
        }
    }

    /// Derives the calendar quarter of a period-end date.
    pub fn from_end_date(end: NaiveDate) -> Self {
        // month0 is 0-indexed, so Q = floor(month0 / 3) + 1
        match end.month0() / 3 {
            0 => Self::Q1,
            1 => Self::Q2,
            2 => Self::Q3,
            _ => Self::Q4,
        }
    }

    /// True for Q1..Q4.
    pub const fn is_quarter(&self) -> bool {
        !matches!(self, Self::FY)
    }

    /// Label as filed ("FY", "Q1", ...).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FY => "FY",
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
        }
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw EDGAR fact with dates parsed and required fields present.
///
/// Facts missing an accession, form, filed date, or a parseable period end
/// are dropped during normalization; they cannot carry provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct SecFact {
    /// Period end date.
    pub end: NaiveDate,
    /// Period start date (absent for instant facts).
    pub start: Option<NaiveDate>,
    /// Reported value.
    pub value: f64,
    /// Accession number of the reporting filing.
    pub accession: String,
    /// SEC-attached fiscal year (the filing's, not necessarily the fact's).
    pub fy: Option<i32>,
    /// SEC-attached fiscal period label.
    pub fp: Option<FiscalPeriod>,
    /// Form type.
    pub form: String,
    /// Date the filing was made.
    pub filed: NaiveDate,
}

impl SecFact {
    /// Normalizes a raw EDGAR fact, dropping it when provenance fields are
    /// missing or dates fail to parse.
    pub fn from_raw(raw: &RawFact) -> Option<Self> {
        let end = parse_date(&raw.end)?;
        let start = match raw.start.as_deref() {
            Some(s) => Some(parse_date(s)?),
            None => None,
        };
        Some(Self {
            end,
            start,
            value: raw.val,
            accession: raw.accn.clone()?,
            fy: raw.fy,
            fp: raw.fp.as_deref().and_then(FiscalPeriod::parse),
            form: raw.form.clone()?,
            filed: parse_date(raw.filed.as_deref()?)?,
        })
    }

    /// Period length in days, when this is a duration fact.
    pub fn duration_days(&self) -> Option<i64> {
        self.start
            .map(|start| self.end.signed_duration_since(start).num_days())
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// The filing a data point came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilingSource {
    /// Accession number.
    pub accession: String,
    /// Date the filing was made.
    pub filing_date: NaiveDate,
    /// Form type.
    pub form: String,
    /// Qualified "taxonomy:Concept" the value was read from.
    pub xbrl_concept: String,
}

/// One resolved value for one metric and one period.
///
/// Data points are immutable once constructed. A restatement never mutates
/// an existing point; it arrives as a later-filed fact for the same period
/// end and wins the dedup instead.
#[derive(Debug, Clone, Serialize)]
pub struct DataPoint {
    /// Metric id.
    pub metric_id: String,
    /// Company CIK, unpadded.
    pub cik: String,
    /// Company legal name.
    pub company_name: String,
    /// Fiscal year derived from the period-end calendar year.
    pub fiscal_year: i32,
    /// Fiscal period.
    pub fiscal_period: FiscalPeriod,
    /// Period start (absent for snapshots).
    pub period_start: Option<NaiveDate>,
    /// Period end.
    pub period_end: NaiveDate,
    /// Value.
    pub value: f64,
    /// Unit code ("USD", "shares", ...).
    pub unit: String,
    /// Source filing.
    pub source: FilingSource,
    /// Accession of the filing that superseded this value, when known.
    pub restated_in: Option<String>,
    /// True when this is the latest-filed value for its period end.
    pub is_latest: bool,
    /// When this point was extracted.
    pub extracted_at: DateTime<Utc>,
    /// Deterministic content checksum.
    pub checksum: String,
}

impl DataPoint {
    /// Content checksum over the identity of the value: company, metric,
    /// period, value, and source accession.
    pub fn compute_checksum(
        cik: &str,
        metric_id: &str,
        fiscal_year: i32,
        fiscal_period: FiscalPeriod,
        value: f64,
        accession: &str,
    ) -> String {
        let payload =
            format!("{cik}|{metric_id}|{fiscal_year}|{fiscal_period}|{value}|{accession}");
        let digest = Sha256::digest(payload.as_bytes());
        let mut out = String::with_capacity(64);
        for byte in digest {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn raw(end: &str, start: Option<&str>) -> RawFact {
        RawFact {
            start: start.map(str::to_string),
            end: end.to_string(),
            val: 100.0,
            accn: Some("0000320193-23-000106".to_string()),
            fy: Some(2023),
            fp: Some("FY".to_string()),
            form: Some("10-K".to_string()),
            filed: Some("2023-11-03".to_string()),
            frame: None,
        }
    }

    #[rstest]
    #[case("2024-03-31", FiscalPeriod::Q1)]
    #[case("2024-06-30", FiscalPeriod::Q2)]
    #[case("2024-09-30", FiscalPeriod::Q3)]
    #[case("2024-12-31", FiscalPeriod::Q4)]
    #[case("2024-01-28", FiscalPeriod::Q1)]
    fn test_quarter_from_end_date(#[case] end: &str, #[case] expected: FiscalPeriod) {
        let end = NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap();
        assert_eq!(FiscalPeriod::from_end_date(end), expected);
    }

    #[test]
    fn test_normalize_duration_fact() {
        let fact = SecFact::from_raw(&raw("2023-09-30", Some("2022-10-01"))).unwrap();
        assert_eq!(fact.duration_days(), Some(364));
        assert_eq!(fact.fp, Some(FiscalPeriod::FY));
    }

    #[test]
    fn test_normalize_instant_fact() {
        let fact = SecFact::from_raw(&raw("2023-09-30", None)).unwrap();
        assert!(fact.start.is_none());
        assert_eq!(fact.duration_days(), None);
    }

    #[test]
    fn test_normalize_drops_incomplete_facts() {
        let mut missing_accn = raw("2023-09-30", None);
        missing_accn.accn = None;
        assert!(SecFact::from_raw(&missing_accn).is_none());

        let mut bad_date = raw("not-a-date", None);
        bad_date.end = "not-a-date".to_string();
        assert!(SecFact::from_raw(&bad_date).is_none());

        let mut missing_filed = raw("2023-09-30", None);
        missing_filed.filed = None;
        assert!(SecFact::from_raw(&missing_filed).is_none());
    }

    #[test]
    fn test_checksum_is_deterministic() {
        let a = DataPoint::compute_checksum("320193", "revenue", 2023, FiscalPeriod::FY, 1.0, "x");
        let b = DataPoint::compute_checksum("320193", "revenue", 2023, FiscalPeriod::FY, 1.0, "x");
        let c = DataPoint::compute_checksum("320193", "revenue", 2023, FiscalPeriod::FY, 2.0, "x");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
