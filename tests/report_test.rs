//! End-to-end tests from a price series to the serialized history report

use chrono::{Duration, NaiveDate};
use serde_json::Value;
use tickerlens::services::classifier::SignalTables;
use tickerlens::services::{build_report, compute_indicators, technical_signals};
use tickerlens::types::{FundamentalSnapshot, PricePoint, PriceSeries, TechnicalSignal};
use tickerlens::AppError;

fn series(symbol: &str, len: usize) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let points = (0..len)
        .map(|i| {
            let close = 500.0 + i as f64 * 0.8 + (i as f64 * 0.3).sin() * 12.0;
            PricePoint {
                date: start + Duration::days(i as i64),
                open: close - 1.5,
                high: close + 4.0,
                low: close - 4.0,
                close,
                volume: 250_000.0,
            }
        })
        .collect();
    PriceSeries::new(symbol, points).unwrap()
}

#[test]
fn test_full_report_shape() {
    let symbol = series("RELIANCE.NS", 260);
    let benchmark = series("^NSEI", 260);
    let snapshot = FundamentalSnapshot {
        trailing_pe: Some(27.3),
        market_cap: Some(19_500_000_000_000.0),
        ..Default::default()
    };
    let report = build_report(
        &symbol,
        Some(&benchmark),
        Some(&snapshot),
        &SignalTables::canonical(),
    )
    .unwrap();

    assert_eq!(report.as_of, symbol.last().unwrap().date);
    assert_eq!(report.technical.len(), 11);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["symbol"], "RELIANCE.NS");
    let kinds: Vec<&str> = json["technical"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["kind"].as_str().unwrap())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "date",
            "price",
            "price",
            "price",
            "price",
            "price",
            "rsi",
            "adx",
            "moving_average_cross",
            "long_term_trend",
            "macd_crossover"
        ]
    );

    let rsi: &Value = &json["technical"][6];
    assert!(rsi["value"].is_f64());
    assert!(rsi["label"]["color"].is_string());
    assert_eq!(json["technical"][1]["field"], "open");

    assert_eq!(json["fundamentals"]["beta"], 1.0);
    assert_eq!(json["fundamentals"]["PE"], 27.3);
    assert_eq!(json["fundamentals"]["MarketCap"], "1,950,000");
    assert!(json["fundamentals"]["EPS"].is_null());
}

#[test]
fn test_short_history_omits_long_term_trend() {
    let report = build_report(&series("TCS.NS", 50), None, None, &SignalTables::canonical()).unwrap();
    assert!(report
        .technical
        .iter()
        .all(|t| !matches!(t, TechnicalSignal::LongTermTrend { .. })));
    assert!(report
        .technical
        .iter()
        .any(|t| matches!(t, TechnicalSignal::MacdCrossover { .. })));
    assert!(report.fundamentals.beta.is_none());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["fundamentals"]["MarketCap"], "0");
}

#[test]
fn test_single_row_report_has_prices_only() {
    let report = build_report(&series("TCS.NS", 1), None, None, &SignalTables::canonical()).unwrap();
    assert_eq!(report.technical.len(), 6);
}

#[test]
fn test_empty_series_is_not_found() {
    let empty = PriceSeries::new("GHOST.NS", Vec::new()).unwrap();
    let err = build_report(&empty, None, None, &SignalTables::canonical()).unwrap_err();
    assert_eq!(err.status(), axum::http::StatusCode::NOT_FOUND);
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn test_values_are_reported_to_two_decimals() {
    let rows = compute_indicators(&series("TCS.NS", 120));
    let signals = technical_signals(rows.last().unwrap(), &SignalTables::canonical());
    for signal in &signals {
        if let TechnicalSignal::Rsi { value, .. } | TechnicalSignal::Adx { value, .. } = signal {
            assert_eq!(*value, (value * 100.0).round() / 100.0);
        }
    }
}
