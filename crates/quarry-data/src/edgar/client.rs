//! The EDGAR HTTP client.

use crate::cache::ResponseCache;
use crate::cik::pad10;
use crate::config::{DataConfig, ttl};
use crate::error::{DataError, Result};
use crate::rate_limit::RateLimiter;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::models::{
    CompanyConcept, CompanyFacts, Frame, FullTextSearch, SearchHit, Submissions, TickerTable,
};

/// Maximum attempts per request (initial try plus retries).
const MAX_ATTEMPTS: u32 = 3;

/// Base backoff delays in seconds before retries; each is scaled by a
/// uniform jitter factor in [1.0, 1.5).
const BACKOFF_BASE_SECS: [f64; 3] = [1.0, 2.0, 4.0];

const DATA_BASE_URL: &str = "https://data.sec.gov";
const WWW_BASE_URL: &str = "https://www.sec.gov";
const SEARCH_BASE_URL: &str = "https://efts.sec.gov/LATEST/search-index";
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Calendar period selector for the frames API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePeriod {
    /// Full calendar year, `CY{YYYY}`.
    Annual(i32),
    /// Calendar quarter, `CY{YYYY}Q{n}`.
    Quarterly(i32, u8),
}

impl fmt::Display for FramePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Annual(year) => write!(f, "CY{year}"),
            Self::Quarterly(year, quarter) => write!(f, "CY{year}Q{quarter}"),
        }
    }
}

/// Parameters for full-text search.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    /// Query string.
    pub query: String,
    /// Restrict to these form types (e.g. `["10-K", "8-K"]`).
    pub forms: Vec<String>,
    /// Start date, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// End date, `YYYY-MM-DD`.
    pub end_date: Option<String>,
    /// Maximum hits returned.
    pub limit: usize,
}

/// Rate-limited, cached client for the EDGAR APIs.
///
/// Every fetch goes through one helper: consult the cache, take a rate-limit
/// token, perform the request with the configured User-Agent, retry
/// transient failures with jittered exponential backoff, then cache the
/// body. Concurrent requests for the same URL are coalesced so a fan-out
/// over one company costs a single network call.
#[derive(Debug)]
pub struct EdgarClient {
    http: reqwest::Client,
    limiter: RateLimiter,
    cache: Arc<ResponseCache>,
    config: DataConfig,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EdgarClient {
    /// Creates a client from `config`, opening the response cache inside the
    /// configured cache directory.
    pub fn new(config: &DataConfig) -> Result<Self> {
        let cache = Arc::new(ResponseCache::open(
            &config.cache_dir,
            config.memory_cache_capacity,
        )?);
        Self::with_cache(config, cache)
    }

    /// Creates a client over an existing cache (shared or in-memory).
    pub fn with_cache(config: &DataConfig, cache: Arc<ResponseCache>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            http,
            limiter: RateLimiter::new(config.requests_per_second),
            cache,
            config: config.clone(),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    /// The response cache behind this client.
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Fetches `url`, serving from cache when possible.
    ///
    /// This is the single choke point every typed fetcher goes through.
    pub async fn fetch_with_rate_limit(&self, url: &str, ttl_hours: u64) -> Result<Arc<[u8]>> {
        let url = &self.config.build_url(url);
        if let Some(body) = self.cache.get(url).await {
            return Ok(body);
        }

        // Coalesce concurrent fetches of the same URL: the first caller does
        // the network round trip, the rest wait and re-read the cache.
        let gate = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(
                in_flight
                    .entry(url.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let result = {
            let _guard = gate.lock().await;
            if let Some(body) = self.cache.get(url).await {
                Ok(body)
            } else {
                self.fetch_with_retry(url, ttl_hours).await
            }
        };

        let mut in_flight = self.in_flight.lock().await;
        in_flight.remove(url);

        result
    }

    async fn fetch_with_retry(&self, url: &str, ttl_hours: u64) -> Result<Arc<[u8]>> {
        let mut last_err = None;

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                let delay = backoff_delay(attempt);
                warn!(url, attempt, delay_ms = delay.as_millis() as u64, "retrying EDGAR request");
                sleep(delay).await;
            }

            self.limiter.acquire().await;
            debug!(url, attempt, "fetching");

            let response = match self.http.get(url).send().await {
                Ok(response) => response,
                Err(err) => {
                    last_err = Some(DataError::Network(err));
                    continue;
                }
            };

            let status = response.status().as_u16();
            match status {
                200..=299 => {
                    let body = response.bytes().await.map_err(DataError::Network)?;
                    self.cache.put(url, &body, ttl_hours).await;
                    return Ok(Arc::from(body.to_vec().into_boxed_slice()));
                }
                404 => return Err(DataError::NotFound(url.to_string())),
                403 => return Err(DataError::Forbidden),
                429 => {
                    last_err = Some(DataError::RateLimited {
                        attempts: attempt,
                    });
                }
                500..=599 => {
                    last_err = Some(DataError::Http {
                        status,
                        message: format!("server error for {url}"),
                    });
                }
                _ => {
                    return Err(DataError::Http {
                        status,
                        message: format!("unexpected status for {url}"),
                    });
                }
            }
        }

        Err(last_err.unwrap_or_else(|| DataError::Http {
            status: 0,
            message: format!("request to {url} failed"),
        }))
    }

    /// Full XBRL fact bundle for a company.
    pub async fn company_facts(&self, cik: &str) -> Result<CompanyFacts> {
        let url = format!(
            "{DATA_BASE_URL}/api/xbrl/companyfacts/CIK{}.json",
            pad10(cik)
        );
        let body = self
            .fetch_with_rate_limit(&url, ttl::COMPANY_FACTS_HOURS)
            .await?;
        serde_json::from_slice(&body)
            .map_err(|e| DataError::Parse(format!("company facts for CIK {cik}: {e}")))
    }

    /// Single-concept fact history for a company.
    pub async fn company_concept(
        &self,
        cik: &str,
        taxonomy: &str,
        concept: &str,
    ) -> Result<CompanyConcept> {
        let url = format!(
            "{DATA_BASE_URL}/api/xbrl/companyconcept/CIK{}/{taxonomy}/{concept}.json",
            pad10(cik)
        );
        let body = self
            .fetch_with_rate_limit(&url, ttl::COMPANY_CONCEPT_HOURS)
            .await?;
        serde_json::from_slice(&body)
            .map_err(|e| DataError::Parse(format!("concept {taxonomy}:{concept}: {e}")))
    }

    /// Filing history for a company.
    pub async fn submissions(&self, cik: &str) -> Result<Submissions> {
        let url = format!("{DATA_BASE_URL}/submissions/CIK{}.json", pad10(cik));
        let body = self
            .fetch_with_rate_limit(&url, ttl::SUBMISSIONS_HOURS)
            .await?;
        serde_json::from_slice(&body)
            .map_err(|e| DataError::Parse(format!("submissions for CIK {cik}: {e}")))
    }

    /// Cross-company snapshot of one concept for one calendar period.
    pub async fn frame(
        &self,
        taxonomy: &str,
        concept: &str,
        unit: &str,
        period: FramePeriod,
    ) -> Result<Frame> {
        let url =
            format!("{DATA_BASE_URL}/api/xbrl/frames/{taxonomy}/{concept}/{unit}/{period}.json");
        let body = self.fetch_with_rate_limit(&url, ttl::FRAMES_HOURS).await?;
        serde_json::from_slice(&body)
            .map_err(|e| DataError::Parse(format!("frame {taxonomy}:{concept} {period}: {e}")))
    }

    /// Full-text search over filings.
    pub async fn search_filings(&self, params: &SearchParams) -> Result<Vec<SearchHit>> {
        let mut url = format!("{SEARCH_BASE_URL}?q={}", encode_query(&params.query));
        if !params.forms.is_empty() {
            url.push_str("&forms=");
            url.push_str(&encode_query(&params.forms.join(",")));
        }
        if let (Some(start), Some(end)) = (&params.start_date, &params.end_date) {
            url.push_str("&dateRange=custom");
            url.push_str(&format!("&startdt={start}&enddt={end}"));
        }

        let body = self.fetch_with_rate_limit(&url, ttl::SEARCH_HOURS).await?;
        let search: FullTextSearch = serde_json::from_slice(&body)
            .map_err(|e| DataError::Parse(format!("full-text search: {e}")))?;

        let mut hits = search.hits.hits;
        if params.limit > 0 {
            hits.truncate(params.limit);
        }
        Ok(hits)
    }

    /// Raw bytes of one document inside a filing.
    pub async fn filing_document(
        &self,
        cik: &str,
        accession: &str,
        filename: &str,
    ) -> Result<Arc<[u8]>> {
        if accession.is_empty() || filename.is_empty() {
            return Err(DataError::InvalidIdentifier(
                "accession and filename are required".to_string(),
            ));
        }
        let accession_no_dashes = accession.replace('-', "");
        let url = format!(
            "{WWW_BASE_URL}/Archives/edgar/data/{}/{accession_no_dashes}/{filename}",
            pad10(cik)
        );
        self.fetch_with_rate_limit(&url, ttl::FILING_DOCUMENTS_HOURS)
            .await
    }

    /// The SEC company tickers table.
    pub async fn company_tickers(&self) -> Result<TickerTable> {
        let body = self
            .fetch_with_rate_limit(COMPANY_TICKERS_URL, ttl::COMPANY_TICKERS_HOURS)
            .await?;
        serde_json::from_slice(&body).map_err(|e| {
            DataError::parse_with_hint(
                format!("company tickers table: {e}"),
                "clear the cache and retry",
            )
        })
    }
}

/// Backoff before retry `attempt`: 1s, 2s, 4s, jittered by [1.0, 1.5).
fn backoff_delay(attempt: u32) -> Duration {
    use rand::Rng;
    let index = ((attempt - 2) as usize).min(BACKOFF_BASE_SECS.len() - 1);
    let jitter: f64 = rand::thread_rng().gen_range(0.0..0.5);
    Duration::from_secs_f64(BACKOFF_BASE_SECS[index] * (1.0 + jitter))
}

/// Percent-encodes a query-string component.
fn encode_query(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
