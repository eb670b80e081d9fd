//! End-to-end engine tests against a mock EDGAR.

use quarry::processor::PeriodType;
use quarry::{CoreContext, QueryEngine, QueryError, ScreenSort};
use quarry_data::DataConfig;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TICKERS_PATH: &str = "/www.sec.gov/files/company_tickers.json";
const AAPL_FACTS_PATH: &str = "/data.sec.gov/api/xbrl/companyfacts/CIK0000320193.json";
const MSFT_FACTS_PATH: &str = "/data.sec.gov/api/xbrl/companyfacts/CIK0000789019.json";

const TICKERS_BODY: &str = r#"{
    "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
    "1": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"}
}"#;

/// Apple-style fixture: revenue reported under the legacy tag through
/// FY2018, the contract-revenue tag since; a restated FY2022 net income; and
/// a Q3 2024 quarter with both YTD and single-quarter values filed.
const AAPL_FACTS_BODY: &str = r#"{
    "cik": 320193,
    "entityName": "Apple Inc.",
    "facts": {
        "us-gaap": {
            "Revenues": {
                "label": "Revenues",
                "units": {
                    "USD": [
                        {"start": "2016-09-25", "end": "2017-09-30", "val": 100,
                         "accn": "ap-17", "fy": 2017, "fp": "FY", "form": "10-K", "filed": "2017-11-03"},
                        {"start": "2017-10-01", "end": "2018-09-29", "val": 110,
                         "accn": "ap-18", "fy": 2018, "fp": "FY", "form": "10-K", "filed": "2018-11-05"},
                        {"start": "2024-01-01", "end": "2024-09-30", "val": 300,
                         "accn": "q-ytd", "fy": 2024, "fp": "Q3", "form": "10-Q", "filed": "2024-11-01"},
                        {"start": "2024-07-01", "end": "2024-09-30", "val": 100,
                         "accn": "q-3mo", "fy": 2024, "fp": "Q3", "form": "10-Q", "filed": "2024-11-01"}
                    ]
                }
            },
            "RevenueFromContractWithCustomerExcludingAssessedTax": {
                "label": "Revenue from contracts with customers",
                "units": {
                    "USD": [
                        {"start": "2019-09-29", "end": "2020-09-26", "val": 120,
                         "accn": "ap-20", "fy": 2020, "fp": "FY", "form": "10-K", "filed": "2020-10-30"},
                        {"start": "2020-09-27", "end": "2021-09-25", "val": 150,
                         "accn": "ap-21", "fy": 2021, "fp": "FY", "form": "10-K", "filed": "2021-10-29"},
                        {"start": "2021-09-26", "end": "2022-09-24", "val": 170,
                         "accn": "ap-22", "fy": 2022, "fp": "FY", "form": "10-K", "filed": "2022-10-28"},
                        {"start": "2022-09-25", "end": "2023-09-30", "val": 190,
                         "accn": "ap-23", "fy": 2023, "fp": "FY", "form": "10-K", "filed": "2023-11-03"},
                        {"start": "2023-10-01", "end": "2024-09-28", "val": 210,
                         "accn": "ap-24", "fy": 2024, "fp": "FY", "form": "10-K", "filed": "2024-11-01"}
                    ]
                }
            },
            "NetIncomeLoss": {
                "label": "Net income",
                "units": {
                    "USD": [
                        {"start": "2022-01-01", "end": "2022-12-31", "val": 100,
                         "accn": "accn-A", "fy": 2022, "fp": "FY", "form": "10-K", "filed": "2023-02-15"},
                        {"start": "2022-01-01", "end": "2022-12-31", "val": 105,
                         "accn": "accn-B", "fy": 2023, "fp": "FY", "form": "10-K", "filed": "2024-02-10"},
                        {"start": "2023-01-01", "end": "2023-12-31", "val": 45,
                         "accn": "ni-23", "fy": 2023, "fp": "FY", "form": "10-K", "filed": "2024-02-10"},
                        {"start": "2024-01-01", "end": "2024-12-31", "val": 50,
                         "accn": "ni-24", "fy": 2024, "fp": "FY", "form": "10-K", "filed": "2025-02-10"}
                    ]
                }
            }
        }
    }
}"#;

/// Microsoft-style fixture for the ratio scenarios: a zero-revenue year.
const MSFT_FACTS_BODY: &str = r#"{
    "cik": 789019,
    "entityName": "MICROSOFT CORP",
    "facts": {
        "us-gaap": {
            "NetIncomeLoss": {
                "label": "Net income",
                "units": {
                    "USD": [
                        {"start": "2023-01-01", "end": "2023-12-31", "val": 10,
                         "accn": "ms-23", "fy": 2023, "fp": "FY", "form": "10-K", "filed": "2024-02-01"},
                        {"start": "2024-01-01", "end": "2024-12-31", "val": 12,
                         "accn": "ms-24", "fy": 2024, "fp": "FY", "form": "10-K", "filed": "2025-02-01"}
                    ]
                }
            },
            "Revenues": {
                "label": "Revenues",
                "units": {
                    "USD": [
                        {"start": "2023-01-01", "end": "2023-12-31", "val": 0,
                         "accn": "ms-23", "fy": 2023, "fp": "FY", "form": "10-K", "filed": "2024-02-01"},
                        {"start": "2024-01-01", "end": "2024-12-31", "val": 200,
                         "accn": "ms-24", "fy": 2024, "fp": "FY", "form": "10-K", "filed": "2025-02-01"}
                    ]
                }
            }
        }
    }
}"#;

async fn mock_edgar() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TICKERS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(TICKERS_BODY))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(AAPL_FACTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_FACTS_BODY))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(MSFT_FACTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(MSFT_FACTS_BODY))
        .mount(&server)
        .await;
    server
}

fn engine_for(server: &MockServer) -> (QueryEngine, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = DataConfig::from_env()
        .with_user_agent("quarry-tests test@example.com")
        .with_cache_dir(dir.path())
        .with_base_url(format!("{}/", server.uri()));
    let ctx = Arc::new(CoreContext::new(config).unwrap());
    (QueryEngine::new(ctx), dir)
}

#[tokio::test]
async fn annual_query_falls_back_to_fresher_concept() {
    let server = mock_edgar().await;
    let (engine, _dir) = engine_for(&server);

    let result = engine
        .query("AAPL", "revenue", 5, None, PeriodType::Annual)
        .await
        .unwrap();

    assert_eq!(
        result.provenance.concept.as_deref(),
        Some("us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax")
    );
    assert_eq!(result.data.len(), 5);
    assert_eq!(result.data.last().unwrap().fiscal_year, 2024);
    assert_eq!(result.data.last().unwrap().value, 210.0);
    assert!(
        result
            .provenance
            .notes
            .iter()
            .any(|n| n.contains("Revenues (max FY2018)"))
    );
}

#[tokio::test]
async fn restated_value_wins_and_is_noted() {
    let server = mock_edgar().await;
    let (engine, _dir) = engine_for(&server);

    let result = engine
        .query("AAPL", "net_income", 5, None, PeriodType::Annual)
        .await
        .unwrap();

    let fy2022 = result
        .data
        .iter()
        .find(|p| p.fiscal_year == 2022)
        .unwrap();
    assert_eq!(fy2022.value, 105.0);
    assert_eq!(fy2022.source.accession, "accn-B");
    assert!(result.provenance.notes.iter().any(|n| n
        == "FY2022 was restated: original $100 → $105 (+5%) in filing 2024-02-10"));
}

#[tokio::test]
async fn quarterly_query_keeps_only_single_quarter_values() {
    let server = mock_edgar().await;
    let (engine, _dir) = engine_for(&server);

    let result = engine
        .query("AAPL", "revenue", 8, None, PeriodType::Quarterly)
        .await
        .unwrap();

    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].value, 100.0);
    assert_eq!(result.data[0].source.accession, "q-3mo");
    assert_eq!(result.provenance.period_type, "Quarterly (single quarter)");
}

#[tokio::test]
async fn target_year_anchors_the_series() {
    let server = mock_edgar().await;
    let (engine, _dir) = engine_for(&server);

    let result = engine
        .query("AAPL", "revenue", 2, Some(2022), PeriodType::Annual)
        .await
        .unwrap();

    let years: Vec<i32> = result.data.iter().map(|p| p.fiscal_year).collect();
    assert_eq!(years, vec![2021, 2022]);
}

#[tokio::test]
async fn unknown_metric_lists_catalog() {
    let server = mock_edgar().await;
    let (engine, _dir) = engine_for(&server);

    let err = engine
        .query("AAPL", "shoe_size", 5, None, PeriodType::Annual)
        .await
        .unwrap_err();
    match err {
        QueryError::MetricNotFound { id, available } => {
            assert_eq!(id, "shoe_size");
            assert!(available.contains(&"revenue".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_company_is_company_not_found() {
    let server = mock_edgar().await;
    let (engine, _dir) = engine_for(&server);

    let err = engine
        .query("ZZZZ", "revenue", 5, None, PeriodType::Annual)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "company_not_found");
    assert_eq!(err.http_status(), 404);
}

#[tokio::test]
async fn compare_isolates_per_ticker_failures() {
    let server = mock_edgar().await;
    let (engine, _dir) = engine_for(&server);

    let outcome = engine
        .compare(
            &["AAPL".to_string(), "ZZZZ".to_string()],
            "revenue",
            5,
        )
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].company.ticker, "AAPL");
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].ticker, "ZZZZ");
    assert_eq!(outcome.errors[0].kind, "company_not_found");
}

#[tokio::test]
async fn ratio_skips_zero_denominator_years() {
    let server = mock_edgar().await;
    let (engine, _dir) = engine_for(&server);

    let outcome = engine.ratio("MSFT", "net_margin", 5).await.unwrap();

    assert_eq!(outcome.data.len(), 1);
    assert_eq!(outcome.data[0].fiscal_year, 2024);
    assert_eq!(outcome.data[0].value, 6.0);
    assert_eq!(outcome.div_by_zero_count, 1);
}

#[tokio::test]
async fn summary_reports_metrics_and_ratios_for_latest_year() {
    let server = mock_edgar().await;
    let (engine, _dir) = engine_for(&server);

    let outcome = engine.summary("AAPL", None, None).await.unwrap();

    assert_eq!(outcome.fiscal_year, 2024);
    let revenue = outcome.metrics.iter().find(|m| m.id == "revenue").unwrap();
    assert_eq!(revenue.value, 210.0);
    let net_income = outcome
        .metrics
        .iter()
        .find(|m| m.id == "net_income")
        .unwrap();
    assert_eq!(net_income.value, 50.0);

    let net_margin = outcome.ratios.iter().find(|r| r.id == "net_margin").unwrap();
    // 50 / 210 = 0.2381 -> 23.8%
    assert_eq!(net_margin.value, 23.8);
}

#[tokio::test]
async fn multi_metric_aligns_years() {
    let server = mock_edgar().await;
    let (engine, _dir) = engine_for(&server);

    let outcome = engine
        .multi_metric(
            "AAPL",
            &["revenue".to_string(), "net_income".to_string()],
            5,
        )
        .await
        .unwrap();

    assert!(outcome.years.contains(&2024));
    let revenue = outcome.metrics.iter().find(|m| m.id == "revenue").unwrap();
    assert_eq!(revenue.values.get(&2024), Some(&210.0));
    let net_income = outcome
        .metrics
        .iter()
        .find(|m| m.id == "net_income")
        .unwrap();
    assert_eq!(net_income.values.get(&2022), Some(&105.0));
}

#[tokio::test]
async fn matrix_shares_one_fiscal_year() {
    let server = mock_edgar().await;
    let (engine, _dir) = engine_for(&server);

    let outcome = engine
        .matrix(
            &["AAPL".to_string(), "MSFT".to_string()],
            &["revenue".to_string(), "net_income".to_string()],
            Some(2024),
        )
        .await
        .unwrap();

    assert_eq!(outcome.fiscal_year, 2024);
    assert_eq!(outcome.companies.len(), 2);
    let aapl = &outcome.companies[0];
    assert_eq!(aapl.values, vec![Some(210.0), Some(50.0)]);
    let msft = &outcome.companies[1];
    assert_eq!(msft.values, vec![Some(200.0), Some(12.0)]);
}

#[tokio::test]
async fn screen_falls_through_to_concept_with_data() {
    let server = mock_edgar().await;
    Mock::given(method("GET"))
        .and(path(
            "/data.sec.gov/api/xbrl/frames/us-gaap/Revenues/USD/CY2024.json",
        ))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/data.sec.gov/api/xbrl/frames/us-gaap/RevenueFromContractWithCustomerExcludingAssessedTax/USD/CY2024.json",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "taxonomy": "us-gaap",
                "tag": "RevenueFromContractWithCustomerExcludingAssessedTax",
                "ccp": "CY2024",
                "uom": "USD",
                "data": [
                    {"cik": 320193, "entityName": "Apple Inc.", "val": 210, "end": "2024-09-28"},
                    {"cik": 789019, "entityName": "MICROSOFT CORP", "val": 200, "end": "2024-06-30"},
                    {"cik": 1045810, "entityName": "NVIDIA CORP", "val": 61, "end": "2025-01-26"}
                ]
            }"#,
        ))
        .mount(&server)
        .await;

    let (engine, _dir) = engine_for(&server);
    let outcome = engine
        .screen("revenue", 2024, Some(100.0), None, ScreenSort::Descending, 2)
        .await
        .unwrap();

    assert_eq!(
        outcome.concept,
        "us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax"
    );
    // NVIDIA filtered out by min_value, two entries survive the limit
    assert_eq!(outcome.total_matches, 2);
    assert_eq!(outcome.entries.len(), 2);
    assert_eq!(outcome.entries[0].cik, "320193");
    assert_eq!(outcome.entries[0].value, 210.0);
    assert_eq!(outcome.entries[1].cik, "789019");
}

#[tokio::test]
async fn screen_with_no_frames_reports_concepts_tried() {
    let server = mock_edgar().await;
    // Every frame URL for the metric answers 404
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (engine, _dir) = engine_for(&server);
    let err = engine
        .screen("gross_profit", 2024, None, None, ScreenSort::Descending, 10)
        .await
        .unwrap_err();

    match err {
        QueryError::NoData { concepts_tried, .. } => {
            assert_eq!(concepts_tried.len(), 1);
            assert_eq!(concepts_tried[0].concept, "GrossProfit");
            assert!(!concepts_tried[0].found);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn summary_fan_out_costs_one_facts_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TICKERS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(TICKERS_BODY))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(AAPL_FACTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(AAPL_FACTS_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let (engine, _dir) = engine_for(&server);
    // ~17 concurrent metric fetches behind one company-facts URL
    let outcome = engine.summary("AAPL", None, None).await.unwrap();
    assert!(!outcome.metrics.is_empty());
}
