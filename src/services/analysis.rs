//! Request-level orchestration: fetch, compute, classify, assemble.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::beta::beta_between;
use crate::services::cache::{Cache, ReportKey};
use crate::services::classifier::SignalTables;
use crate::services::indicators::compute_indicators;
use crate::services::report::assemble_report;
use crate::sources::{SearchQuery, YahooFinanceClient};
use crate::types::{FundamentalSnapshot, Fundamentals, HistoryReport, PriceSeries, SymbolMatch};

/// Compute the report for an already loaded series.
///
/// The benchmark and fundamentals are optional: without them beta and the
/// fundamental fields are reported as absent.
pub fn build_report(
    series: &PriceSeries,
    benchmark: Option<&PriceSeries>,
    snapshot: Option<&FundamentalSnapshot>,
    tables: &SignalTables,
) -> Result<HistoryReport> {
    if series.is_empty() {
        return Err(AppError::NotFound("No data found".to_string()));
    }

    let rows = compute_indicators(series);
    let beta = benchmark.and_then(|b| beta_between(series, b));
    if benchmark.is_some() && beta.is_none() {
        debug!(symbol = series.symbol(), "Beta undefined over the trailing window");
    }

    let fundamentals = Fundamentals::from_snapshot(beta, &snapshot.cloned().unwrap_or_default());
    assemble_report(series.symbol(), &rows, tables, fundamentals)
        .ok_or_else(|| AppError::NotFound("No data found".to_string()))
}

/// History and search service shared by the HTTP handlers.
pub struct AnalysisService {
    yahoo: YahooFinanceClient,
    config: Arc<Config>,
    tables: Arc<SignalTables>,
    reports: Option<Cache<ReportKey, Arc<HistoryReport>>>,
}

impl AnalysisService {
    pub fn new(yahoo: YahooFinanceClient, config: Arc<Config>, tables: Arc<SignalTables>) -> Self {
        let reports = config.report_cache_ttl().map(Cache::new);
        Self {
            yahoo,
            config,
            tables,
            reports,
        }
    }

    /// Drop expired cached reports.
    pub fn cleanup_cache(&self) {
        if let Some(reports) = &self.reports {
            reports.cleanup();
        }
    }

    /// Technical and fundamental report for `symbol`.
    pub async fn history(&self, symbol: &str) -> Result<Arc<HistoryReport>> {
        let symbol = self.config.exchange_symbol(symbol);
        if symbol.is_empty() || symbol == self.config.exchange_suffix.to_uppercase() {
            return Err(AppError::BadRequest("symbol is required".to_string()));
        }

        let range = self.config.history_range.as_str();
        let key = ReportKey::new(&symbol, range, self.config.exchange_today());
        if let Some(report) = self.reports.as_ref().and_then(|c| c.get(&key)) {
            debug!(symbol = %symbol, "Report cache hit");
            return Ok(report);
        }

        let (series, benchmark, snapshot) = tokio::join!(
            self.yahoo.daily_series(&symbol, range),
            self.yahoo.daily_series(&self.config.benchmark_symbol, range),
            self.yahoo.fundamentals(&symbol),
        );
        let series = series?;

        let benchmark = benchmark
            .map_err(|e| {
                warn!(benchmark = %self.config.benchmark_symbol, "Benchmark fetch failed: {}", e)
            })
            .ok();
        let snapshot = snapshot
            .map_err(|e| warn!(symbol = %symbol, "Fundamentals fetch failed: {}", e))
            .ok();

        let report = Arc::new(build_report(
            &series,
            benchmark.as_ref(),
            snapshot.as_ref(),
            &self.tables,
        )?);
        info!(
            symbol = %symbol,
            rows = series.len(),
            as_of = %report.as_of,
            "Computed history report"
        );

        // A degraded report is served but not cached, so the next request
        // retries the failed collaborator.
        let complete = benchmark.is_some() && snapshot.is_some();
        if let Some(reports) = self.reports.as_ref().filter(|_| complete) {
            reports.insert(key, report.clone());
        }
        Ok(report)
    }

    /// Symbols matching `company_name` on the configured exchange.
    pub async fn search(&self, company_name: &str) -> Result<Vec<SymbolMatch>> {
        let text = company_name.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest("company_name is required".to_string()));
        }

        let search = &self.config.search;
        let results = self
            .yahoo
            .search(SearchQuery {
                text,
                region: &search.region,
                lang: &search.lang,
                limit: search.limit,
                exchange: Some(&self.config.exchange),
            })
            .await?;

        debug!(query = text, hits = results.len(), "Symbol search");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{config, local_endpoints, serve};
    use crate::types::{ColorTier, PricePoint, TechnicalSignal};
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use chrono::{Duration, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 500.0,
            })
            .collect();
        PriceSeries::new(symbol, points).unwrap()
    }

    #[test]
    fn test_build_report_empty_series_is_not_found() {
        let empty = PriceSeries::new("NONE.NS", Vec::new()).unwrap();
        let err = build_report(&empty, None, None, &SignalTables::canonical()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "No data found"));
    }

    #[test]
    fn test_build_report_without_collaborators() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let report =
            build_report(&series("TCS.NS", &closes), None, None, &SignalTables::canonical())
                .unwrap();

        assert_eq!(report.symbol, "TCS.NS");
        assert_eq!(report.fundamentals, Fundamentals::default());
        let ma = report
            .technical
            .iter()
            .find(|s| matches!(s, TechnicalSignal::MovingAverageCross { .. }))
            .unwrap();
        // Rising closes put MA7 above MA13.
        assert_eq!(ma.label().tier, ColorTier::Buy);
        assert!(!report
            .technical
            .iter()
            .any(|s| matches!(s, TechnicalSignal::LongTermTrend { .. })));
    }

    #[test]
    fn test_build_report_with_benchmark_and_fundamentals() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + ((i % 5) as f64) * 2.0).collect();
        let symbol = series("TCS.NS", &closes);
        let benchmark = series("^NSEI", &closes);
        let snapshot = FundamentalSnapshot {
            trailing_pe: Some(28.456),
            ..Default::default()
        };

        let report = build_report(
            &symbol,
            Some(&benchmark),
            Some(&snapshot),
            &SignalTables::canonical(),
        )
        .unwrap();
        assert_eq!(report.fundamentals.beta, Some(1.0));
        assert_eq!(report.fundamentals.pe, Some(28.46));
    }

    // =========================================================================
    // Report cache Tests
    // =========================================================================

    const CHART_JSON: &str = r#"{"chart": {"result": [{
        "meta": {"gmtoffset": 19800},
        "timestamp": [1735703100, 1735789500, 1735875900],
        "indicators": {"quote": [{
            "open":   [100.0, 101.0, 102.0],
            "high":   [101.0, 102.0, 103.0],
            "low":    [99.0, 100.0, 101.0],
            "close":  [100.5, 101.5, 102.5],
            "volume": [1000, 2000, 3000]
        }]}
    }], "error": null}}"#;

    const SUMMARY_JSON: &str = r#"{"quoteSummary": {"result": [{
        "summaryDetail": {"trailingPE": {"raw": 21.0}}
    }], "error": null}}"#;

    #[derive(Clone)]
    struct StubYahoo {
        benchmark_up: bool,
        charts: Arc<AtomicUsize>,
    }

    async fn chart(
        State(stub): State<StubYahoo>,
        Path(symbol): Path<String>,
    ) -> (StatusCode, &'static str) {
        stub.charts.fetch_add(1, Ordering::SeqCst);
        if symbol.starts_with('^') && !stub.benchmark_up {
            (StatusCode::INTERNAL_SERVER_ERROR, "")
        } else {
            (StatusCode::OK, CHART_JSON)
        }
    }

    async fn service(benchmark_up: bool) -> (AnalysisService, Arc<AtomicUsize>) {
        let stub = StubYahoo {
            benchmark_up,
            charts: Arc::new(AtomicUsize::new(0)),
        };
        let charts = stub.charts.clone();
        let router = Router::new()
            .route("/cookie", get(|| async { "" }))
            .route("/v1/test/getcrumb", get(|| async { "crumb" }))
            .route("/v8/finance/chart/:symbol", get(chart))
            .route("/v10/finance/quoteSummary/:symbol", get(|| async { SUMMARY_JSON }))
            .route(
                "/ws/fundamentals-timeseries/v1/finance/timeseries/:symbol",
                get(|| async { r#"{"timeseries": {"result": []}}"# }),
            )
            .with_state(stub);

        let base = serve(router).await;
        let timeout = std::time::Duration::from_secs(5);
        let yahoo = YahooFinanceClient::with_endpoints(timeout, local_endpoints(&base)).unwrap();
        let config = Arc::new(Config {
            report_cache_ttl_secs: 300,
            ..config()
        });
        let service = AnalysisService::new(yahoo, config, Arc::new(SignalTables::canonical()));
        (service, charts)
    }

    #[tokio::test]
    async fn test_complete_report_is_cached() {
        let (service, charts) = service(true).await;

        let first = service.history("tcs").await.unwrap();
        assert_eq!(first.symbol, "TCS.NS");
        assert!(first.fundamentals.beta.is_some());
        assert_eq!(first.fundamentals.pe, Some(21.0));
        assert_eq!(charts.load(Ordering::SeqCst), 2);

        let second = service.history("TCS.NS").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(charts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_degraded_report_is_not_cached() {
        let (service, charts) = service(false).await;

        let first = service.history("TCS").await.unwrap();
        assert!(first.fundamentals.beta.is_none());
        assert_eq!(first.fundamentals.pe, Some(21.0));
        assert_eq!(charts.load(Ordering::SeqCst), 2);

        service.history("TCS").await.unwrap();
        assert_eq!(charts.load(Ordering::SeqCst), 4);
    }
}
