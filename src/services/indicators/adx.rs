//! Average Directional Index (ADX).
//!
//! Pipeline per bar (from the second bar on):
//!   1. +DM / -DM from the high/low deltas; the larger move wins, clipped at
//!      zero, and a tie yields both zero.
//!   2. TR = max(high - low, |high - prev_close|, |low - prev_close|).
//!   3. Wilder-smooth TR, +DM and -DM (alpha = 1/period, seeded on the
//!      first bar with a predecessor).
//!   4. +DI = 100 * +DM_s / TR_s, -DI likewise.
//!   5. DX = 100 * |+DI - -DI| / (+DI + -DI).
//!   6. ADX = Wilder EMA of DX.
//!
//! ADX is reported only once `period` bars have been folded in.

use super::ema::Ema;
use crate::types::PricePoint;

/// Default ADX look-back.
pub const ADX_PERIOD: usize = 14;

/// Directional movement and true range between two consecutive bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalMove {
    pub plus_dm: f64,
    pub minus_dm: f64,
    pub true_range: f64,
}

impl DirectionalMove {
    pub fn between(previous: &PricePoint, current: &PricePoint) -> Self {
        let up_move = current.high - previous.high;
        let down_move = previous.low - current.low;

        let plus_dm = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        let minus_dm = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };

        let true_range = (current.high - current.low)
            .max((current.high - previous.close).abs())
            .max((current.low - previous.close).abs());

        Self {
            plus_dm,
            minus_dm,
            true_range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdxState {
    period: usize,
    bars: usize,
    true_range: Ema,
    plus_dm: Ema,
    minus_dm: Ema,
    adx: Ema,
}

impl Default for AdxState {
    fn default() -> Self {
        Self::new(ADX_PERIOD)
    }
}

impl AdxState {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            bars: 0,
            true_range: Ema::wilder(period),
            plus_dm: Ema::wilder(period),
            minus_dm: Ema::wilder(period),
            adx: Ema::wilder(period),
        }
    }

    /// Fold in the bar `current`, which follows `previous`.
    #[must_use]
    pub fn next(self, previous: &PricePoint, current: &PricePoint) -> Self {
        let dm = DirectionalMove::between(previous, current);
        let true_range = self.true_range.next(dm.true_range);
        let plus_dm = self.plus_dm.next(dm.plus_dm);
        let minus_dm = self.minus_dm.next(dm.minus_dm);

        let (plus_di, minus_di) = directional_indices(
            plus_dm.value().unwrap_or(0.0),
            minus_dm.value().unwrap_or(0.0),
            true_range.value().unwrap_or(0.0),
        );

        Self {
            period: self.period,
            bars: self.bars + 1,
            true_range,
            plus_dm,
            minus_dm,
            adx: self.adx.next(directional_index(plus_di, minus_di)),
        }
    }

    /// Current (+DI, -DI), `None` before the first bar pair.
    pub fn directional_indicators(&self) -> Option<(f64, f64)> {
        Some(directional_indices(
            self.plus_dm.value()?,
            self.minus_dm.value()?,
            self.true_range.value()?,
        ))
    }

    /// ADX, `None` until `period` bar pairs have been seen.
    pub fn value(&self) -> Option<f64> {
        if self.bars < self.period.max(1) {
            return None;
        }
        self.adx.value()
    }
}

/// +DI and -DI from smoothed movement; both zero when the smoothed true
/// range is zero.
pub fn directional_indices(plus_dm: f64, minus_dm: f64, true_range: f64) -> (f64, f64) {
    if true_range == 0.0 {
        return (0.0, 0.0);
    }
    (
        100.0 * plus_dm / true_range,
        100.0 * minus_dm / true_range,
    )
}

/// DX from the two directional indicators; zero when both are zero.
pub fn directional_index(plus_di: f64, minus_di: f64) -> f64 {
    let sum = plus_di + minus_di;
    if sum == 0.0 {
        return 0.0;
    }
    100.0 * (plus_di - minus_di).abs() / sum
}
