//! Yahoo Finance client for daily history, symbol search and fundamentals.
//!
//! Uses the unofficial Yahoo Finance endpoints (no API key). quoteSummary
//! needs a session cookie plus the matching crumb, both fetched lazily and
//! kept on the client.

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::types::{FundamentalSnapshot, PricePoint, PriceSeries, SymbolMatch};

const QUERY1_URL: &str = "https://query1.finance.yahoo.com";
const QUERY2_URL: &str = "https://query2.finance.yahoo.com";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const QUOTE_SUMMARY_MODULES: &str = "summaryDetail,defaultKeyStatistics,financialData,\
price,incomeStatementHistory,balanceSheetHistory";
const TIMESERIES_TYPES: &str = "annualOperatingIncome,annualTotalAssets,annualCurrentLiabilities";
/// Years of annual statements requested from the timeseries endpoint.
const TIMESERIES_YEARS: i64 = 5;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Base URLs of the Yahoo hosts the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YahooEndpoints {
    /// Chart, search and crumb host.
    pub query1: String,
    /// quoteSummary and fundamentals timeseries host.
    pub query2: String,
    /// Page that sets the session cookie.
    pub cookie: String,
}

impl Default for YahooEndpoints {
    fn default() -> Self {
        Self {
            query1: QUERY1_URL.to_string(),
            query2: QUERY2_URL.to_string(),
            cookie: COOKIE_URL.to_string(),
        }
    }
}

impl YahooEndpoints {
    fn chart(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.query1, symbol)
    }

    fn search(&self) -> String {
        format!("{}/v1/finance/search", self.query1)
    }

    fn crumb(&self) -> String {
        format!("{}/v1/test/getcrumb", self.query1)
    }

    fn quote_summary(&self, symbol: &str) -> String {
        format!("{}/v10/finance/quoteSummary/{}", self.query2, symbol)
    }

    fn timeseries(&self, symbol: &str) -> String {
        format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{}",
            self.query2, symbol
        )
    }
}

// ---------------------------------------------------------------------------
// Chart endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    #[serde(default)]
    meta: YahooMeta,
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

/// Bars are stamped in UTC; the exchange offset maps them to the local
/// trading day.
#[derive(Debug, Default, Deserialize)]
struct YahooMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn positive(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten().filter(|v| *v > 0.0)
}

/// Turn a chart result into a validated series.
///
/// Bars with a missing or non-positive price are dropped. Yahoo can emit
/// the live bar next to the last settled one with the same date; the later
/// bar wins.
fn series_from_chart(symbol: &str, result: YahooResult) -> Result<PriceSeries> {
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = result.meta.gmtoffset;

    let mut points: Vec<PricePoint> = Vec::with_capacity(timestamps.len());
    let mut skipped = 0usize;

    for (i, &ts) in timestamps.iter().enumerate() {
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            skipped += 1;
            continue;
        };
        let bar = (
            positive(&quote.open, i),
            positive(&quote.high, i),
            positive(&quote.low, i),
            positive(&quote.close, i),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = bar else {
            skipped += 1;
            continue;
        };
        let point = PricePoint {
            date,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0),
        };

        match points.last_mut() {
            Some(last) if last.date == date => *last = point,
            _ => points.push(point),
        }
    }

    if skipped > 0 {
        debug!(symbol, skipped, "Dropped incomplete Yahoo bars");
    }

    Ok(PriceSeries::new(symbol, points)?)
}

// ---------------------------------------------------------------------------
// Search endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct YahooSearchResponse {
    #[serde(default)]
    quotes: Vec<YahooSearchQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooSearchQuote {
    symbol: Option<String>,
    shortname: Option<String>,
    longname: Option<String>,
    exch_disp: Option<String>,
    quote_type: Option<String>,
}

/// Parameters for a symbol search.
#[derive(Debug, Clone, Copy)]
pub struct SearchQuery<'a> {
    pub text: &'a str,
    pub region: &'a str,
    pub lang: &'a str,
    pub limit: usize,
    /// Keep only hits listed on this exchange. Hits with no exchange are
    /// kept.
    pub exchange: Option<&'a str>,
}

fn matches_from_search(response: YahooSearchResponse, exchange: Option<&str>) -> Vec<SymbolMatch> {
    response
        .quotes
        .into_iter()
        .filter_map(|q| {
            let symbol = q.symbol.filter(|s| !s.is_empty())?;
            if let (Some(wanted), Some(listed)) = (exchange, q.exch_disp.as_deref()) {
                if !listed.eq_ignore_ascii_case(wanted) {
                    return None;
                }
            }
            Some(SymbolMatch {
                symbol,
                shortname: q.shortname.clone().or_else(|| q.longname.clone()),
                longname: q.longname.or(q.shortname),
                exchange: q.exch_disp,
                quote_type: q.quote_type,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// quoteSummary endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<YahooError>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`, and sends `{}`
/// when a value is unknown.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    summary_detail: SummaryDetail,
    #[serde(default)]
    default_key_statistics: KeyStatistics,
    #[serde(default)]
    financial_data: FinancialData,
    #[serde(default)]
    income_statement_history: IncomeStatementHistory,
    #[serde(default)]
    balance_sheet_history: BalanceSheetHistory,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    trailing_eps: Option<RawValue>,
    book_value: Option<RawValue>,
    price_to_book: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    current_price: Option<RawValue>,
    debt_to_equity: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeStatementHistory {
    #[serde(default)]
    income_statement_history: Vec<IncomeStatement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeStatement {
    operating_income: Option<RawValue>,
    ebit: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceSheetHistory {
    #[serde(default)]
    balance_sheet_statements: Vec<BalanceSheet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceSheet {
    total_assets: Option<RawValue>,
    total_current_liabilities: Option<RawValue>,
}

/// Return on capital employed in percent:
/// `ebit / (total_assets - current_liabilities) * 100`.
pub fn return_on_capital_employed(
    ebit: f64,
    total_assets: f64,
    current_liabilities: f64,
) -> Option<f64> {
    let capital = total_assets - current_liabilities;
    if capital == 0.0 || !capital.is_finite() {
        return None;
    }
    let roce = ebit / capital * 100.0;
    roce.is_finite().then_some(roce)
}

impl From<QuoteSummaryResult> for FundamentalSnapshot {
    fn from(r: QuoteSummaryResult) -> Self {
        // Statements are newest first.
        let income = r.income_statement_history.income_statement_history.first();
        let balance = r.balance_sheet_history.balance_sheet_statements.first();
        let roce = income.zip(balance).and_then(|(income, balance)| {
            let ebit = raw(&income.operating_income).or_else(|| raw(&income.ebit))?;
            return_on_capital_employed(
                ebit,
                raw(&balance.total_assets)?,
                raw(&balance.total_current_liabilities)?,
            )
        });

        Self {
            trailing_pe: raw(&r.summary_detail.trailing_pe),
            trailing_eps: raw(&r.default_key_statistics.trailing_eps),
            current_price: raw(&r.financial_data.current_price),
            market_cap: raw(&r.summary_detail.market_cap),
            book_value: raw(&r.default_key_statistics.book_value),
            debt_to_equity: raw(&r.financial_data.debt_to_equity),
            price_to_book: raw(&r.default_key_statistics.price_to_book),
            roce,
        }
    }
}

// ---------------------------------------------------------------------------
// Fundamentals timeseries endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: Timeseries,
}

#[derive(Debug, Deserialize)]
struct Timeseries {
    result: Option<Vec<TimeseriesResult>>,
}

/// One statement line. The values sit under a key named after the line
/// type, e.g. `"annualTotalAssets": [...]`.
#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    meta: TimeseriesMeta,
    #[serde(flatten)]
    values: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(rename = "type", default)]
    kind: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportedPoint {
    as_of_date: String,
    #[serde(default)]
    reported_value: RawValue,
}

impl TimeseriesResult {
    /// Line type and its most recent reported value.
    fn latest(self) -> Option<(String, f64)> {
        let mut values = self.values;
        let kind = self.meta.kind.into_iter().next()?;
        let points: Vec<Option<ReportedPoint>> =
            serde_json::from_value(values.remove(&kind)?).ok()?;

        // ISO dates order lexically.
        let value = points
            .into_iter()
            .flatten()
            .filter_map(|p| Some((p.as_of_date, p.reported_value.raw?)))
            .max_by(|a, b| a.0.cmp(&b.0))?
            .1;
        Some((kind, value))
    }
}

/// ROCE from the latest annual operating income, total assets and current
/// liabilities.
fn roce_from_timeseries(response: TimeseriesResponse) -> Option<f64> {
    let latest: HashMap<String, f64> = response
        .timeseries
        .result
        .unwrap_or_default()
        .into_iter()
        .filter_map(TimeseriesResult::latest)
        .collect();

    return_on_capital_employed(
        *latest.get("annualOperatingIncome")?,
        *latest.get("annualTotalAssets")?,
        *latest.get("annualCurrentLiabilities")?,
    )
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Yahoo Finance API client.
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    endpoints: Arc<YahooEndpoints>,
    crumb: Arc<Mutex<Option<String>>>,
}

fn checked(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::ExternalApi(format!(
            "Yahoo Finance returned {} for {}",
            status, url
        )));
    }
    Ok(response)
}

impl YahooFinanceClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_endpoints(timeout, YahooEndpoints::default())
    }

    pub fn with_endpoints(timeout: Duration, endpoints: YahooEndpoints) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            endpoints: Arc::new(endpoints),
            crumb: Arc::new(Mutex::new(None)),
        })
    }

    async fn send(&self, url: &str, query: &[(&str, &str)]) -> Result<Response> {
        debug!(url, "Requesting Yahoo Finance");
        Ok(self.client.get(url).query(query).send().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = checked(url, self.send(url, query).await?)?;
        Ok(response.json().await?)
    }

    /// Crumb paired with the session cookie. Cached until `refresh` asks
    /// for a new one.
    async fn crumb(&self, refresh: bool) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if !refresh {
            if let Some(crumb) = cached.as_ref() {
                return Ok(crumb.clone());
            }
        }

        // The cookie page answers 404 but still sets the session cookie.
        if let Err(e) = self.client.get(&self.endpoints.cookie).send().await {
            debug!("Yahoo cookie request failed: {}", e);
        }

        let url = self.endpoints.crumb();
        let crumb = checked(&url, self.send(&url, &[]).await?)?
            .text()
            .await?
            .trim()
            .to_string();
        if crumb.is_empty() || crumb.contains(char::is_whitespace) {
            return Err(AppError::ExternalApi(
                "Yahoo Finance returned no crumb".to_string(),
            ));
        }

        debug!(refresh, "Fetched Yahoo crumb");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    /// Daily bars for `symbol` over `range` ("6mo", "1y", "2y", ...).
    ///
    /// An unknown symbol yields an empty series rather than an error, so the
    /// caller decides how to report it.
    pub async fn daily_series(&self, symbol: &str, range: &str) -> Result<PriceSeries> {
        let url = self.endpoints.chart(symbol);
        let data: YahooChartResponse = self
            .get_json(
                &url,
                &[("range", range), ("interval", "1d"), ("includePrePost", "false")],
            )
            .await?;

        if let Some(error) = data.chart.error {
            warn!(symbol, code = %error.code, "Yahoo chart error: {}", error.description);
            return Ok(PriceSeries::new(symbol, Vec::new())?);
        }

        match data.chart.result.and_then(|r| r.into_iter().next()) {
            Some(result) => series_from_chart(symbol, result),
            None => Ok(PriceSeries::new(symbol, Vec::new())?),
        }
    }

    /// Search symbols by company name.
    pub async fn search(&self, query: SearchQuery<'_>) -> Result<Vec<SymbolMatch>> {
        let limit = query.limit.to_string();
        let response: YahooSearchResponse = self
            .get_json(
                &self.endpoints.search(),
                &[
                    ("q", query.text),
                    ("quotesCount", limit.as_str()),
                    ("newsCount", "0"),
                    ("lang", query.lang),
                    ("region", query.region),
                ],
            )
            .await?;

        Ok(matches_from_search(response, query.exchange))
    }

    /// Valuation and balance-sheet readings for `symbol`.
    ///
    /// A rejected crumb is replaced once before giving up. ROCE falls back
    /// to the annual timeseries when the statement modules lack it.
    pub async fn fundamentals(&self, symbol: &str) -> Result<FundamentalSnapshot> {
        let url = self.endpoints.quote_summary(symbol);
        let crumb = self.crumb(false).await?;
        let mut response = self
            .send(&url, &[("modules", QUOTE_SUMMARY_MODULES), ("crumb", crumb.as_str())])
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(symbol, "Yahoo rejected the crumb, refreshing");
            let crumb = self.crumb(true).await?;
            response = self
                .send(&url, &[("modules", QUOTE_SUMMARY_MODULES), ("crumb", crumb.as_str())])
                .await?;
        }

        let data: QuoteSummaryResponse = checked(&url, response)?.json().await?;
        if let Some(error) = data.quote_summary.error {
            return Err(AppError::ExternalApi(format!(
                "Yahoo quoteSummary error: {} - {}",
                error.code, error.description
            )));
        }

        let mut snapshot = data
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .map(FundamentalSnapshot::from)
            .ok_or_else(|| AppError::ExternalApi(format!("No fundamentals for {}", symbol)))?;

        if snapshot.roce.is_none() {
            match self.timeseries_roce(symbol).await {
                Ok(roce) => snapshot.roce = roce,
                Err(e) => debug!(symbol, "Fundamentals timeseries unavailable: {}", e),
            }
        }
        Ok(snapshot)
    }

    async fn timeseries_roce(&self, symbol: &str) -> Result<Option<f64>> {
        let url = self.endpoints.timeseries(symbol);
        let now = Utc::now().timestamp();
        let period1 = (now - TIMESERIES_YEARS * 366 * 86_400).to_string();
        let period2 = now.to_string();

        let data: TimeseriesResponse = self
            .get_json(
                &url,
                &[
                    ("symbol", symbol),
                    ("type", TIMESERIES_TYPES),
                    ("period1", period1.as_str()),
                    ("period2", period2.as_str()),
                ],
            )
            .await?;
        Ok(roce_from_timeseries(data))
    }
}
