//! Company identifier resolution.
//!
//! Maps whatever the caller typed (a ticker, a household name, an alias, a
//! fragment of the legal name) to a canonical CIK, surfacing ambiguity as
//! suggestions instead of guessing.

use crate::edgar::EdgarClient;
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Common-name aliases for well-known registrants. Lowercase keys.
const ALIASES: &[(&str, &str)] = &[
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("google", "GOOGL"),
    ("alphabet", "GOOGL"),
    ("amazon", "AMZN"),
    ("meta", "META"),
    ("facebook", "META"),
    ("tesla", "TSLA"),
    ("nvidia", "NVDA"),
    ("netflix", "NFLX"),
    ("berkshire", "BRK-B"),
    ("berkshire hathaway", "BRK-B"),
    ("jpmorgan", "JPM"),
    ("jp morgan", "JPM"),
    ("walmart", "WMT"),
    ("disney", "DIS"),
    ("coca cola", "KO"),
    ("coca-cola", "KO"),
    ("pepsi", "PEP"),
    ("intel", "INTC"),
    ("amd", "AMD"),
    ("ibm", "IBM"),
    ("oracle", "ORCL"),
    ("salesforce", "CRM"),
    ("adobe", "ADBE"),
    ("exxon", "XOM"),
    ("chevron", "CVX"),
    ("pfizer", "PFE"),
    ("johnson & johnson", "JNJ"),
    ("boeing", "BA"),
    ("goldman sachs", "GS"),
    ("visa", "V"),
    ("mastercard", "MA"),
];

/// Maximum number of suggestions surfaced on an ambiguous match.
const MAX_SUGGESTIONS: usize = 5;

/// A resolved registrant.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CompanyIdentity {
    /// Canonical CIK, unpadded decimal string.
    pub cik: String,
    /// Ticker symbol, uppercase.
    pub ticker: String,
    /// Legal name as registered with the SEC.
    pub name: String,
}

/// Outcome of a resolution attempt.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// The match, when exactly one company fits.
    pub company: Option<CompanyIdentity>,
    /// Candidate companies when the query was ambiguous.
    pub suggestions: Vec<CompanyIdentity>,
}

/// Resolves user identifiers to CIKs using the SEC ticker table.
///
/// The table is fetched lazily on first use and then served from the
/// response cache (168 h TTL), so repeated resolutions cost nothing.
#[derive(Debug)]
pub struct CompanyResolver {
    client: Arc<EdgarClient>,
    table: OnceCell<Vec<CompanyIdentity>>,
}

impl CompanyResolver {
    /// Creates a resolver over the given client.
    pub fn new(client: Arc<EdgarClient>) -> Self {
        Self {
            client,
            table: OnceCell::new(),
        }
    }

    /// Resolves `query` to a company.
    ///
    /// Order, short-circuiting on the first hit:
    /// 1. exact ticker (uppercased query)
    /// 2. exact alias (lowercased query)
    /// 3. exact company name (case-insensitive)
    /// 4. substring of company name: unique hit wins, multiple hits return
    ///    up to five suggestions, none returns empty-handed
    pub async fn resolve(&self, query: &str) -> Result<Resolution> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Resolution::default());
        }

        let table = self.table().await?;

        let ticker = query.to_uppercase();
        if let Some(company) = table.iter().find(|c| c.ticker == ticker) {
            return Ok(found(company));
        }

        let lowered = query.to_lowercase();
        if let Some((_, alias_ticker)) = ALIASES.iter().find(|(alias, _)| *alias == lowered)
            && let Some(company) = table.iter().find(|c| c.ticker == *alias_ticker)
        {
            debug!(query, ticker = alias_ticker, "alias hit");
            return Ok(found(company));
        }

        if let Some(company) = table.iter().find(|c| c.name.to_lowercase() == lowered) {
            return Ok(found(company));
        }

        let matches: Vec<&CompanyIdentity> = table
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&lowered))
            .collect();
        match matches.len() {
            0 => Ok(Resolution::default()),
            1 => Ok(found(matches[0])),
            _ => {
                debug!(query, candidates = matches.len(), "ambiguous company query");
                Ok(Resolution {
                    company: None,
                    suggestions: matches
                        .into_iter()
                        .take(MAX_SUGGESTIONS)
                        .cloned()
                        .collect(),
                })
            }
        }
    }

    async fn table(&self) -> Result<&Vec<CompanyIdentity>> {
        self.table
            .get_or_try_init(|| async {
                let raw = self.client.company_tickers().await?;

                // The SEC keys rows by their position ("0", "1", ...) which
                // roughly orders by market cap; restore that order so
                // suggestion lists are deterministic and sensible.
                let mut rows: Vec<(usize, CompanyIdentity)> = raw
                    .into_iter()
                    .filter_map(|(index, row)| {
                        let index: usize = index.parse().ok()?;
                        Some((
                            index,
                            CompanyIdentity {
                                cik: row.cik_str.to_string(),
                                ticker: row.ticker.to_uppercase(),
                                name: row.title,
                            },
                        ))
                    })
                    .collect();
                rows.sort_by_key(|(index, _)| *index);
                Ok(rows.into_iter().map(|(_, company)| company).collect())
            })
            .await
    }
}

fn found(company: &CompanyIdentity) -> Resolution {
    Resolution {
        company: Some(company.clone()),
        suggestions: Vec::new(),
    }
}
