//! Integration tests for the beta calculator

use chrono::{Duration, NaiveDate};
use tickerlens::services::beta::{beta_between, compute_beta, daily_returns, DailyReturn};
use tickerlens::types::{PricePoint, PriceSeries};

fn series(start: NaiveDate, closes: &[f64]) -> PriceSeries {
    let points = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: start + Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        })
        .collect();
    PriceSeries::new("X", points).unwrap()
}

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn prices(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 1_000.0 + (i as f64 * 0.37).sin() * 40.0 + i as f64)
        .collect()
}

#[test]
fn test_beta_half_when_benchmark_moves_twice() {
    let symbol: Vec<DailyReturn> = [0.012, -0.004, 0.02, -0.015, 0.007, 0.0, 0.011]
        .iter()
        .enumerate()
        .map(|(i, &value)| DailyReturn {
            date: start() + Duration::days(i as i64),
            value,
        })
        .collect();
    let benchmark: Vec<DailyReturn> = symbol
        .iter()
        .map(|r| DailyReturn {
            value: r.value * 2.0,
            ..*r
        })
        .collect();

    let beta = compute_beta(&symbol, &benchmark).unwrap();
    assert!((beta - 0.5).abs() < 1e-9, "beta {beta}");
}

#[test]
fn test_beta_is_scale_invariant() {
    let a = prices(120);
    let b: Vec<f64> = prices(120).iter().map(|p| p * 0.8 + 50.0).collect();

    let base = beta_between(&series(start(), &a), &series(start(), &b)).unwrap();
    for c in [0.01, 3.0, 250.0] {
        let sa: Vec<f64> = a.iter().map(|p| p * c).collect();
        let sb: Vec<f64> = b.iter().map(|p| p * c).collect();
        let scaled = beta_between(&series(start(), &sa), &series(start(), &sb)).unwrap();
        assert!((scaled - base).abs() < 1e-9, "c={c}: {scaled} vs {base}");
    }
}

#[test]
fn test_beta_only_uses_shared_dates() {
    let symbol = series(start(), &prices(60));
    // Benchmark starts ten days later; only the overlap counts.
    let benchmark = series(start() + Duration::days(10), &prices(60));
    let beta = beta_between(&symbol, &benchmark);
    assert!(beta.is_some());

    let disjoint = series(start() + Duration::days(500), &prices(60));
    assert!(beta_between(&symbol, &disjoint).is_none());
}

#[test]
fn test_beta_uses_trailing_year_only() {
    // Two years of data where the first year is wild and the second mirrors
    // the benchmark exactly.
    let days = 730;
    let bench = prices(days);
    let symbol: Vec<f64> = bench
        .iter()
        .enumerate()
        .map(|(i, &p)| if i < 300 { p * (1.0 + (i % 7) as f64 * 0.05) } else { p })
        .collect();
    let beta = beta_between(&series(start(), &symbol), &series(start(), &bench)).unwrap();
    assert!((beta - 1.0).abs() < 1e-9, "beta {beta}");
}

#[test]
fn test_degenerate_inputs() {
    let flat = series(start(), &[100.0; 30]);
    let moving = series(start(), &prices(30));
    assert!(beta_between(&moving, &flat).is_none());

    let single = series(start(), &[100.0]);
    assert!(daily_returns(&single).is_empty());
    assert!(beta_between(&single, &single).is_none());
}
