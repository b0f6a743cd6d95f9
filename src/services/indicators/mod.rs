//! Indicator engine: daily OHLCV series in, one [`IndicatorRow`] per day out.
//!
//! The engine is a `scan` over the series. Each step takes the previous
//! [`EngineState`] by value and returns a fresh state together with the row
//! for that date. Rows are produced lazily, so a caller can stop at any row.

pub mod adx;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use adx::{AdxState, DirectionalMove, ADX_PERIOD};
pub use ema::{ema_series, Ema};
pub use macd::MacdState;
pub use rsi::{rsi_from_averages, rsi_series, RsiState, RSI_PERIOD};
pub use sma::{sma_at, sma_series};

use crate::types::{IndicatorRow, PricePoint, PriceSeries};

/// Look-back settings for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorEngine {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub adx_period: usize,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self {
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: RSI_PERIOD,
            adx_period: ADX_PERIOD,
        }
    }
}

/// Moving-average windows reported on every row.
pub const MA_WINDOWS: [usize; 4] = [7, 13, 100, 200];

/// Running state carried between rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineState {
    rows: usize,
    macd: MacdState,
    rsi: RsiState,
    adx: AdxState,
}

impl EngineState {
    fn new(engine: &IndicatorEngine) -> Self {
        Self {
            rows: 0,
            macd: MacdState::new(engine.macd_fast, engine.macd_slow, engine.macd_signal),
            rsi: RsiState::new(engine.rsi_period),
            adx: AdxState::new(engine.adx_period),
        }
    }

    /// State after folding in `current`; `previous` is the prior row, if any.
    #[must_use]
    fn step(self, previous: Option<&PricePoint>, current: &PricePoint) -> Self {
        let (rsi, adx) = match previous {
            Some(prev) => (
                self.rsi.next(current.close - prev.close),
                self.adx.next(prev, current),
            ),
            None => (self.rsi, self.adx),
        };
        Self {
            rows: self.rows + 1,
            macd: self.macd.next(current.close),
            rsi,
            adx,
        }
    }

    /// MACD and its signal line are seeded on the first row and reported
    /// from the second.
    fn macd_pair(&self) -> (Option<f64>, Option<f64>) {
        if self.rows < 2 {
            return (None, None);
        }
        (self.macd.macd(), self.macd.signal())
    }
}

impl IndicatorEngine {
    /// Lazily compute one row per input point, in series order.
    pub fn rows<'a>(&self, series: &'a PriceSeries) -> impl Iterator<Item = IndicatorRow> + 'a {
        let points = series.points();
        let closes = series.closes();

        points
            .iter()
            .enumerate()
            .scan(EngineState::new(self), move |state, (index, point)| {
                let previous = index.checked_sub(1).map(|i| &points[i]);
                *state = state.step(previous, point);
                let (macd, signal) = state.macd_pair();
                let [ma7, ma13, ma100, ma200] = MA_WINDOWS.map(|w| sma_at(&closes, index, w));

                Some(IndicatorRow {
                    macd,
                    signal,
                    ma7,
                    ma13,
                    ma100,
                    ma200,
                    rsi: state.rsi.value(),
                    adx: state.adx.value(),
                    ..IndicatorRow::from_point(point)
                })
            })
    }

    /// Compute every row eagerly.
    pub fn compute(&self, series: &PriceSeries) -> Vec<IndicatorRow> {
        self.rows(series).collect()
    }
}

/// Indicator table for `series` with the default look-backs.
pub fn compute_indicators(series: &PriceSeries) -> Vec<IndicatorRow> {
    IndicatorEngine::default().compute(series)
}
