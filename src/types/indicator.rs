use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PricePoint;

/// One output row of the indicator engine: the input OHLCV for a date plus
/// every derived value. A `None` field means there was not enough history
/// for that indicator on this row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub ma7: Option<f64>,
    pub ma13: Option<f64>,
    pub ma100: Option<f64>,
    pub ma200: Option<f64>,
    pub rsi: Option<f64>,
    pub adx: Option<f64>,
}

impl IndicatorRow {
    /// A row carrying only the price data, with every indicator absent.
    pub fn from_point(point: &PricePoint) -> Self {
        Self {
            date: point.date,
            open: point.open,
            high: point.high,
            low: point.low,
            close: point.close,
            volume: point.volume,
            macd: None,
            signal: None,
            ma7: None,
            ma13: None,
            ma100: None,
            ma200: None,
            rsi: None,
            adx: None,
        }
    }

    /// Copy of this row with every value rounded to two decimals, the
    /// precision the API reports and classifies at.
    pub fn rounded(&self) -> Self {
        let r = |v: Option<f64>| v.map(round2);
        Self {
            date: self.date,
            open: round2(self.open),
            high: round2(self.high),
            low: round2(self.low),
            close: round2(self.close),
            volume: round2(self.volume),
            macd: r(self.macd),
            signal: r(self.signal),
            ma7: r(self.ma7),
            ma13: r(self.ma13),
            ma100: r(self.ma100),
            ma200: r(self.ma200),
            rsi: r(self.rsi),
            adx: r(self.adx),
        }
    }
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
