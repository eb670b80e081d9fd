//! Typed shapes for EDGAR API responses.
//!
//! The company-facts JSON has taxonomy and concept names as *map keys*, not
//! fixed fields, so the fact bundle is modeled as nested maps and traversed
//! rather than declared as a fixed struct.

use serde::Deserialize;
use std::collections::HashMap;

/// Full XBRL fact bundle for one company.
///
/// From `GET /api/xbrl/companyfacts/CIK{cik10}.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFacts {
    /// CIK as a number (the SEC serializes it unpadded here).
    pub cik: u64,
    /// Registrant legal name.
    pub entity_name: String,
    /// taxonomy -> concept -> bundle.
    pub facts: HashMap<String, HashMap<String, ConceptBundle>>,
}

impl CompanyFacts {
    /// Facts for one `(taxonomy, concept, unit)` triple, if reported.
    pub fn unit_facts(&self, taxonomy: &str, concept: &str, unit: &str) -> Option<&[RawFact]> {
        self.facts
            .get(taxonomy)?
            .get(concept)?
            .units
            .as_ref()?
            .get(unit)
            .map(Vec::as_slice)
    }
}

/// All reported values for one XBRL concept.
#[derive(Debug, Clone, Deserialize)]
pub struct ConceptBundle {
    /// Human label from the taxonomy.
    #[serde(default)]
    pub label: Option<String>,
    /// Taxonomy description.
    #[serde(default)]
    pub description: Option<String>,
    /// unit (e.g. "USD", "shares", "pure") -> reported facts.
    #[serde(default)]
    pub units: Option<HashMap<String, Vec<RawFact>>>,
}

/// A single XBRL fact as EDGAR reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawFact {
    /// Period start date (absent for instant facts).
    #[serde(default)]
    pub start: Option<String>,
    /// Period end date.
    pub end: String,
    /// Reported numeric value.
    pub val: f64,
    /// Accession number of the filing that reported this value.
    #[serde(default)]
    pub accn: Option<String>,
    /// Fiscal year as attached by the SEC (the *filing's* fiscal year, not
    /// necessarily the fact's; comparatives carry the filing's fy).
    #[serde(default)]
    pub fy: Option<i32>,
    /// Fiscal period label: FY, Q1..Q4.
    #[serde(default)]
    pub fp: Option<String>,
    /// Form type (10-K, 10-K/A, 10-Q, ...).
    #[serde(default)]
    pub form: Option<String>,
    /// Date the filing was made.
    #[serde(default)]
    pub filed: Option<String>,
    /// Calendar frame tag, when EDGAR assigned one.
    #[serde(default)]
    pub frame: Option<String>,
}

/// Fact history of a single concept for one company.
///
/// From `GET /api/xbrl/companyconcept/CIK{cik10}/{taxonomy}/{concept}.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyConcept {
    /// CIK as a number.
    pub cik: u64,
    /// Taxonomy the concept belongs to.
    pub taxonomy: String,
    /// Concept name.
    pub tag: String,
    /// Registrant legal name.
    pub entity_name: String,
    /// unit -> reported facts.
    pub units: HashMap<String, Vec<RawFact>>,
}

/// Company submission history.
///
/// From `GET /submissions/CIK{cik10}.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Submissions {
    /// CIK (serialized as a string on this endpoint).
    pub cik: String,
    /// Registrant legal name.
    pub name: String,
    /// Known ticker symbols.
    #[serde(default)]
    pub tickers: Vec<String>,
    /// Filing history container.
    pub filings: FilingsContainer,
}

/// Container for filings data.
#[derive(Debug, Clone, Deserialize)]
pub struct FilingsContainer {
    /// Most recent filings as parallel arrays.
    pub recent: RecentFilings,
}

/// Recent filings, column-oriented exactly as EDGAR serves them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFilings {
    /// Accession numbers.
    pub accession_number: Vec<String>,
    /// Filing dates.
    pub filing_date: Vec<String>,
    /// Report (period-end) dates.
    #[serde(default)]
    pub report_date: Vec<String>,
    /// Form types.
    pub form: Vec<String>,
    /// Primary document filenames.
    #[serde(default)]
    pub primary_document: Vec<String>,
}

/// One filing, row-oriented for callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingRef {
    /// Accession number.
    pub accession_number: String,
    /// Date the filing was made.
    pub filing_date: String,
    /// Period-end the filing reports on (may be empty).
    pub report_date: String,
    /// Form type.
    pub form: String,
    /// Primary document filename (may be empty).
    pub primary_document: String,
}

impl RecentFilings {
    /// Iterates the parallel arrays as rows.
    pub fn iter(&self) -> impl Iterator<Item = FilingRef> + '_ {
        (0..self.accession_number.len()).map(move |i| FilingRef {
            accession_number: self.accession_number[i].clone(),
            filing_date: self.filing_date.get(i).cloned().unwrap_or_default(),
            report_date: self.report_date.get(i).cloned().unwrap_or_default(),
            form: self.form.get(i).cloned().unwrap_or_default(),
            primary_document: self.primary_document.get(i).cloned().unwrap_or_default(),
        })
    }

    /// Filings whose form starts with `prefix` (e.g. "10-K" matches 10-K/A).
    pub fn with_form_prefix(&self, prefix: &str) -> Vec<FilingRef> {
        self.iter().filter(|f| f.form.starts_with(prefix)).collect()
    }
}

/// Cross-company snapshot of one concept for one calendar period.
///
/// From `GET /api/xbrl/frames/{taxonomy}/{concept}/{unit}/{period}.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Frame {
    /// Taxonomy queried.
    pub taxonomy: String,
    /// Concept queried.
    pub tag: String,
    /// Calendar period tag, e.g. "CY2024".
    pub ccp: String,
    /// Unit of measure.
    pub uom: String,
    /// Per-company values.
    #[serde(default)]
    pub data: Vec<FrameFact>,
}

/// One company's value inside a frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameFact {
    /// CIK as a number.
    pub cik: u64,
    /// Registrant legal name.
    pub entity_name: String,
    /// Reported value.
    pub val: f64,
    /// Period end date.
    #[serde(default)]
    pub end: Option<String>,
    /// Accession of the source filing.
    #[serde(default)]
    pub accn: Option<String>,
}

/// Full-text search response from `efts.sec.gov`.
#[derive(Debug, Clone, Deserialize)]
pub struct FullTextSearch {
    /// Elasticsearch-style hits envelope.
    pub hits: SearchHits,
}

/// Hits envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHits {
    /// Total match count.
    pub total: SearchTotal,
    /// Returned hits.
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// Total match count.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchTotal {
    /// Number of matching filings.
    pub value: u64,
}

/// One full-text search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    /// Document id, "accession:filename".
    #[serde(rename = "_id")]
    pub id: String,
    /// Hit metadata.
    #[serde(rename = "_source")]
    pub source: SearchSource,
}

/// Metadata of a full-text search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSource {
    /// CIKs of the filers.
    #[serde(default)]
    pub ciks: Vec<String>,
    /// Display names of the filers.
    #[serde(default)]
    pub display_names: Vec<String>,
    /// Form type.
    #[serde(default)]
    pub file_type: Option<String>,
    /// Filing date.
    #[serde(default)]
    pub file_date: Option<String>,
}

/// One row of the SEC company tickers table.
///
/// The table itself is `{"0": {...}, "1": {...}}`, a map from row index.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerRow {
    /// CIK as a number (despite the field name).
    pub cik_str: u64,
    /// Ticker symbol.
    pub ticker: String,
    /// Company name.
    pub title: String,
}

/// The parsed ticker table.
pub type TickerTable = HashMap<String, TickerRow>;
