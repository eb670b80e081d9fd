//! SEC EDGAR client: typed fetchers over the rate-limited, cached HTTP layer.
//!
//! Five data families are exposed, all free and anonymous apart from the
//! mandatory User-Agent header:
//! - company facts (full XBRL fact bundles)
//! - submission histories
//! - XBRL frames (cross-company slices of one concept)
//! - full-text search
//! - raw filing documents
//!
//! # Example
//!
//! ```no_run
//! use quarry_data::{DataConfig, edgar::EdgarClient};
//!
//! # async fn example() -> quarry_data::Result<()> {
//! let client = EdgarClient::new(&DataConfig::from_env())?;
//! let facts = client.company_facts("320193").await?; // Apple Inc.
//! println!("{} taxonomies", facts.facts.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod models;

pub use client::{EdgarClient, FramePeriod, SearchParams};
pub use models::{
    CompanyConcept, CompanyFacts, ConceptBundle, FilingRef, FilingsContainer, Frame, FrameFact,
    FullTextSearch, RawFact, RecentFilings, SearchHit, SearchHits, SearchSource, SearchTotal,
    Submissions, TickerRow, TickerTable,
};
