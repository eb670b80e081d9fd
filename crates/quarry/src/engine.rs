//! The query engine: thin orchestration over resolver, client, processor,
//! calculations, and provenance.
//!
//! Batch operations fan out with `join_all` and isolate per-ticker failures;
//! concurrent fetches of the same company share one network call through the
//! client's request coalescing, so a summary's ~20 metric fetches cost a
//! single company-facts round trip.

use crate::context::CoreContext;
use crate::error::QueryError;
use crate::outcome::{
    CompareOutcome, MatrixColumn, MatrixOutcome, MetricRef, MetricSeries, MultiMetricOutcome,
    QueryOutcome, RatioOutcome, RatioProvenance, RatioRef, ScreenEntry, ScreenOutcome,
    SummaryMetric, SummaryOutcome, SummaryRatio, TickerError,
};
use futures::future::join_all;
use quarry_data::DataError;
use quarry_data::edgar::FramePeriod;
use quarry_data::resolver::CompanyIdentity;
use quarry_xbrl::calc::{RatioComposeError, calculate_series, compose_ratio};
use quarry_xbrl::catalog::{
    MetricDefinition, RatioDefinition, metric_by_id, metrics, ratio_by_id, ratios,
};
use quarry_xbrl::processor::{
    ConceptAttempt, FetchResult, PeriodType, extract_annual, extract_quarterly,
};
use quarry_xbrl::provenance::build_provenance;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Default number of annual periods fetched for summaries.
const DEFAULT_TREND_YEARS: usize = 5;

/// Sort direction for screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenSort {
    /// Largest values first.
    #[default]
    Descending,
    /// Smallest values first.
    Ascending,
}

/// The coarse operations external surfaces consume.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    ctx: Arc<CoreContext>,
}

impl QueryEngine {
    /// Creates an engine over a shared context.
    pub fn new(ctx: Arc<CoreContext>) -> Self {
        Self { ctx }
    }

    /// Resolves one metric series for one company.
    ///
    /// `periods` counts years or quarters per `period_type`; `target_year`
    /// anchors the series to end at that fiscal year instead of the latest.
    pub async fn query(
        &self,
        company_query: &str,
        metric_id: &str,
        periods: usize,
        target_year: Option<i32>,
        period_type: PeriodType,
    ) -> Result<QueryOutcome, QueryError> {
        if periods == 0 {
            return Err(QueryError::Validation(
                "periods must be at least 1".to_string(),
            ));
        }

        let company = self.resolve(company_query).await?;
        let metric = find_metric(metric_id)?;
        let result = self
            .fetch_series(&company, metric, periods, target_year, period_type)
            .await?;

        if result.data_points.is_empty() {
            return Err(QueryError::NoData {
                message: format!(
                    "no {} data for {} ({})",
                    period_word(period_type),
                    metric.display_name,
                    company.name
                ),
                concepts_tried: result.selection.concepts_tried,
            });
        }

        let calculations = calculate_series(&result.data_points);
        let provenance = build_provenance(
            &result.data_points,
            &result.selection,
            &result.restatements,
            metric,
        );

        Ok(QueryOutcome {
            company,
            metric: MetricRef::from(metric),
            data: result.data_points,
            calculations,
            provenance,
        })
    }

    /// One metric across several companies. Per-ticker failures land in
    /// `errors`; one bad ticker never aborts the rest.
    pub async fn compare(
        &self,
        tickers: &[String],
        metric_id: &str,
        years: usize,
    ) -> Result<CompareOutcome, QueryError> {
        let metric = find_metric(metric_id)?;

        let outcomes = join_all(tickers.iter().map(|ticker| async move {
            let outcome = self
                .query(ticker, metric_id, years, None, PeriodType::Annual)
                .await;
            (ticker.clone(), outcome)
        }))
        .await;

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for (ticker, outcome) in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(err) => errors.push(TickerError {
                    ticker,
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                }),
            }
        }

        Ok(CompareOutcome {
            metric: MetricRef::from(metric),
            results,
            errors,
        })
    }

    /// A derived ratio composed from two catalog metrics.
    pub async fn ratio(
        &self,
        company_query: &str,
        ratio_id: &str,
        years: usize,
    ) -> Result<RatioOutcome, QueryError> {
        let company = self.resolve(company_query).await?;
        let ratio = find_ratio(ratio_id)?;
        let numerator_metric = find_metric(ratio.numerator)?;
        let denominator_metric = find_metric(ratio.denominator)?;

        // Both legs in parallel; the second is a cache hit on the shared
        // company-facts URL once the first lands.
        let (numerator, denominator) = tokio::join!(
            self.fetch_series(&company, numerator_metric, years, None, PeriodType::Annual),
            self.fetch_series(&company, denominator_metric, years, None, PeriodType::Annual),
        );
        let numerator = numerator?;
        let denominator = denominator?;

        let composed =
            compose_ratio(&numerator.data_points, &denominator.data_points, ratio).map_err(
                |err| {
                    let message = match err {
                        RatioComposeError::NoOverlap => format!(
                            "no overlapping periods between {} and {}",
                            numerator_metric.display_name, denominator_metric.display_name
                        ),
                        RatioComposeError::AllDivByZero { .. } => format!(
                            "{} was zero in every overlapping year",
                            denominator_metric.display_name
                        ),
                    };
                    let mut concepts_tried = numerator.selection.concepts_tried.clone();
                    concepts_tried.extend(denominator.selection.concepts_tried.clone());
                    QueryError::NoData {
                        message,
                        concepts_tried,
                    }
                },
            )?;

        let provenance = RatioProvenance {
            numerator: build_provenance(
                &numerator.data_points,
                &numerator.selection,
                &numerator.restatements,
                numerator_metric,
            ),
            denominator: build_provenance(
                &denominator.data_points,
                &denominator.selection,
                &denominator.restatements,
                denominator_metric,
            ),
        };

        Ok(RatioOutcome {
            company,
            ratio: RatioRef::from(ratio),
            data: composed.points,
            div_by_zero_count: composed.div_by_zero_count,
            provenance,
        })
    }

    /// Every catalog metric plus the nine derived ratios for one fiscal year.
    pub async fn summary(
        &self,
        company_query: &str,
        target_year: Option<i32>,
        trend_years: Option<usize>,
    ) -> Result<SummaryOutcome, QueryError> {
        let company = self.resolve(company_query).await?;
        let trend = trend_years.unwrap_or(DEFAULT_TREND_YEARS).max(2);

        // All catalog metrics in parallel. Request coalescing collapses the
        // fan-out into one company-facts fetch.
        let fetched = join_all(metrics().iter().map(|metric| {
            self.fetch_series(&company, metric, trend, None, PeriodType::Annual)
        }))
        .await;

        let mut series: Vec<(&'static MetricDefinition, FetchResult)> = Vec::new();
        for (metric, result) in metrics().iter().zip(fetched) {
            match result {
                Ok(result) if !result.data_points.is_empty() => series.push((metric, result)),
                Ok(_) => {}
                // A metric the company never reports is a gap, not a failure
                Err(QueryError::NoData { .. }) => {}
                Err(err) => return Err(err),
            }
        }

        let latest_year = series
            .iter()
            .filter_map(|(_, r)| r.data_points.last().map(|p| p.fiscal_year))
            .max();
        let Some(fiscal_year) = target_year.or(latest_year) else {
            return Err(QueryError::NoData {
                message: format!("no annual data for any catalog metric ({})", company.name),
                concepts_tried: Vec::new(),
            });
        };

        let mut metric_lines = Vec::new();
        for (metric, result) in &series {
            let Some(point) = result
                .data_points
                .iter()
                .find(|p| p.fiscal_year == fiscal_year)
            else {
                continue;
            };
            let yoy_change = calculate_series(&result.data_points)
                .yoy_changes
                .iter()
                .find(|y| y.fiscal_year == fiscal_year)
                .and_then(|y| y.change_percent);
            metric_lines.push(SummaryMetric {
                id: metric.id.to_string(),
                display_name: metric.display_name.to_string(),
                unit_type: metric.unit_type,
                value: point.value,
                yoy_change,
            });
        }

        let mut ratio_lines = Vec::new();
        for ratio in ratios() {
            let numerator = series.iter().find(|(m, _)| m.id == ratio.numerator);
            let denominator = series.iter().find(|(m, _)| m.id == ratio.denominator);
            let (Some((_, num)), Some((_, den))) = (numerator, denominator) else {
                continue;
            };
            let Ok(composed) = compose_ratio(&num.data_points, &den.data_points, ratio) else {
                continue;
            };
            if let Some(point) = composed.points.iter().find(|p| p.fiscal_year == fiscal_year) {
                ratio_lines.push(SummaryRatio {
                    id: ratio.id.to_string(),
                    display_name: ratio.display_name.to_string(),
                    format: ratio.format,
                    value: point.value,
                });
            }
        }

        debug!(
            company = %company.name,
            fiscal_year,
            metrics = metric_lines.len(),
            ratios = ratio_lines.len(),
            "summary assembled"
        );

        Ok(SummaryOutcome {
            company,
            fiscal_year,
            metrics: metric_lines,
            ratios: ratio_lines,
        })
    }

    /// Aligned year-by-year values for several metrics of one company.
    pub async fn multi_metric(
        &self,
        company_query: &str,
        metric_ids: &[String],
        years: usize,
    ) -> Result<MultiMetricOutcome, QueryError> {
        let metric_defs = metric_ids
            .iter()
            .map(|id| find_metric(id))
            .collect::<Result<Vec<_>, _>>()?;
        let company = self.resolve(company_query).await?;

        let fetched = join_all(metric_defs.iter().map(|metric| {
            self.fetch_series(&company, metric, years, None, PeriodType::Annual)
        }))
        .await;

        let mut all_years = BTreeSet::new();
        let mut metric_series = Vec::new();
        for (metric, result) in metric_defs.iter().zip(fetched) {
            let mut values = std::collections::BTreeMap::new();
            if let Ok(result) = result {
                for point in &result.data_points {
                    all_years.insert(point.fiscal_year);
                    values.insert(point.fiscal_year, point.value);
                }
            }
            metric_series.push(MetricSeries {
                id: metric.id.to_string(),
                display_name: metric.display_name.to_string(),
                values,
            });
        }

        Ok(MultiMetricOutcome {
            company,
            years: all_years.into_iter().collect(),
            metrics: metric_series,
        })
    }

    /// Companies × metrics for one shared fiscal year.
    pub async fn matrix(
        &self,
        tickers: &[String],
        metric_ids: &[String],
        year: Option<i32>,
    ) -> Result<MatrixOutcome, QueryError> {
        let metric_defs = metric_ids
            .iter()
            .map(|id| find_metric(id))
            .collect::<Result<Vec<_>, _>>()?;
        let metric_defs = &metric_defs;

        let per_company = join_all(tickers.iter().map(|ticker| async move {
            let fetched: Result<_, QueryError> = async {
                let company = self.resolve(ticker).await?;
                let series = join_all(metric_defs.iter().map(|metric| {
                    self.fetch_series(&company, metric, usize::MAX, None, PeriodType::Annual)
                }))
                .await;
                Ok((company, series))
            }
            .await;
            (ticker.clone(), fetched)
        }))
        .await;

        let mut companies = Vec::new();
        let mut errors = Vec::new();
        for (ticker, fetched) in per_company {
            match fetched {
                Ok((company, series)) => companies.push((company, series)),
                Err(err) => errors.push(TickerError {
                    ticker,
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                }),
            }
        }

        // Shared year: the caller's, else the freshest year any company has.
        let fiscal_year = year.or_else(|| {
            companies
                .iter()
                .flat_map(|(_, series)| series.iter())
                .filter_map(|result| result.as_ref().ok())
                .filter_map(|r| r.data_points.last().map(|p| p.fiscal_year))
                .max()
        });
        let Some(fiscal_year) = fiscal_year else {
            return Err(QueryError::NoData {
                message: "no annual data for any requested company".to_string(),
                concepts_tried: Vec::new(),
            });
        };

        let columns = companies
            .into_iter()
            .map(|(company, series)| {
                let values = series
                    .iter()
                    .map(|result| {
                        result.as_ref().ok().and_then(|r| {
                            r.data_points
                                .iter()
                                .find(|p| p.fiscal_year == fiscal_year)
                                .map(|p| p.value)
                        })
                    })
                    .collect();
                MatrixColumn { company, values }
            })
            .collect();

        Ok(MatrixOutcome {
            fiscal_year,
            metrics: metric_defs.iter().map(|m| MetricRef::from(*m)).collect(),
            companies: columns,
            errors,
        })
    }

    /// Cross-company ranking for one metric and calendar year via the
    /// frames API. Candidate concepts are tried in priority order until one
    /// returns a non-empty frame.
    pub async fn screen(
        &self,
        metric_id: &str,
        year: i32,
        min_value: Option<f64>,
        max_value: Option<f64>,
        sort: ScreenSort,
        limit: usize,
    ) -> Result<ScreenOutcome, QueryError> {
        let metric = find_metric(metric_id)?;
        let unit = metric.unit_code();
        let mut attempts = Vec::new();

        for concept in metric.concepts {
            let frame = self
                .ctx
                .client()
                .frame(
                    concept.taxonomy,
                    concept.concept,
                    unit,
                    FramePeriod::Annual(year),
                )
                .await;

            let frame = match frame {
                Ok(frame) => frame,
                Err(DataError::NotFound(_)) => {
                    attempts.push(attempt_for(concept, false, 0, None));
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            if frame.data.is_empty() {
                attempts.push(attempt_for(concept, true, 0, None));
                continue;
            }

            let mut entries: Vec<ScreenEntry> = frame
                .data
                .iter()
                .filter(|f| min_value.is_none_or(|min| f.val >= min))
                .filter(|f| max_value.is_none_or(|max| f.val <= max))
                .map(|f| ScreenEntry {
                    cik: f.cik.to_string(),
                    name: f.entity_name.clone(),
                    value: f.val,
                })
                .collect();
            let total_matches = entries.len();

            entries.sort_by(|a, b| match sort {
                ScreenSort::Descending => b.value.total_cmp(&a.value),
                ScreenSort::Ascending => a.value.total_cmp(&b.value),
            });
            if limit > 0 {
                entries.truncate(limit);
            }

            return Ok(ScreenOutcome {
                metric: MetricRef::from(metric),
                fiscal_year: year,
                concept: concept.qualified(),
                total_matches,
                entries,
            });
        }

        Err(QueryError::NoData {
            message: format!("no frame data for {} in CY{year}", metric.display_name),
            concepts_tried: attempts,
        })
    }

    async fn resolve(&self, query: &str) -> Result<CompanyIdentity, QueryError> {
        let resolution = self.ctx.resolver().resolve(query).await?;
        if let Some(company) = resolution.company {
            return Ok(company);
        }
        if resolution.suggestions.is_empty() {
            Err(QueryError::CompanyNotFound {
                query: query.to_string(),
            })
        } else {
            Err(QueryError::CompanyAmbiguous {
                query: query.to_string(),
                suggestions: resolution.suggestions,
            })
        }
    }

    /// Fetches the fact bundle and runs the processor for one metric.
    async fn fetch_series(
        &self,
        company: &CompanyIdentity,
        metric: &MetricDefinition,
        periods: usize,
        target_year: Option<i32>,
        period_type: PeriodType,
    ) -> Result<FetchResult, QueryError> {
        let facts = match self.ctx.client().company_facts(&company.cik).await {
            Ok(facts) => facts,
            Err(DataError::NotFound(_)) => {
                return Err(QueryError::NoData {
                    message: format!("no XBRL facts published for {}", company.name),
                    concepts_tried: Vec::new(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        // With a target year, extract the full history first and trim after
        // anchoring; otherwise let the processor take the most recent slice.
        let take = if target_year.is_some() {
            usize::MAX
        } else {
            periods
        };
        let mut result = match period_type {
            PeriodType::Annual => extract_annual(&facts, company, metric, take),
            PeriodType::Quarterly => extract_quarterly(&facts, company, metric, take),
        };

        if let Some(target) = target_year {
            result.data_points.retain(|p| p.fiscal_year <= target);
            let excess = result.data_points.len().saturating_sub(periods);
            if excess > 0 {
                result.data_points.drain(..excess);
            }
        }

        Ok(result)
    }
}

fn find_metric(id: &str) -> Result<&'static MetricDefinition, QueryError> {
    metric_by_id(id).ok_or_else(|| QueryError::MetricNotFound {
        id: id.to_string(),
        available: metrics().iter().map(|m| m.id.to_string()).collect(),
    })
}

fn find_ratio(id: &str) -> Result<&'static RatioDefinition, QueryError> {
    ratio_by_id(id).ok_or_else(|| QueryError::RatioNotFound {
        id: id.to_string(),
        available: ratios().iter().map(|r| r.id.to_string()).collect(),
    })
}

fn attempt_for(
    concept: &quarry_xbrl::catalog::XbrlConcept,
    found: bool,
    count: usize,
    max_fiscal_year: Option<i32>,
) -> ConceptAttempt {
    ConceptAttempt {
        taxonomy: concept.taxonomy.to_string(),
        concept: concept.concept.to_string(),
        priority: concept.priority,
        found,
        count,
        max_fiscal_year,
    }
}

const fn period_word(period_type: PeriodType) -> &'static str {
    match period_type {
        PeriodType::Annual => "annual",
        PeriodType::Quarterly => "quarterly",
    }
}
