//! Relative Strength Index (RSI) with Wilder smoothing.
//!
//! gain = max(delta, 0), loss = max(-delta, 0). Average gain and loss are
//! Wilder EMAs (alpha = 1/period) seeded by the first delta. Then
//! RS = avg_gain / avg_loss and RSI = 100 - 100 / (1 + RS).

use super::ema::Ema;

/// Default RSI look-back.
pub const RSI_PERIOD: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiState {
    avg_gain: Ema,
    avg_loss: Ema,
}

impl Default for RsiState {
    fn default() -> Self {
        Self::new(RSI_PERIOD)
    }
}

impl RsiState {
    pub fn new(period: usize) -> Self {
        Self {
            avg_gain: Ema::wilder(period),
            avg_loss: Ema::wilder(period),
        }
    }

    /// Fold in one close-to-close change.
    #[must_use]
    pub fn next(self, delta: f64) -> Self {
        Self {
            avg_gain: self.avg_gain.next(delta.max(0.0)),
            avg_loss: self.avg_loss.next((-delta).max(0.0)),
        }
    }

    pub fn avg_gain(&self) -> Option<f64> {
        self.avg_gain.value()
    }

    pub fn avg_loss(&self) -> Option<f64> {
        self.avg_loss.value()
    }

    /// RSI, `None` until at least one delta has been seen.
    pub fn value(&self) -> Option<f64> {
        Some(rsi_from_averages(self.avg_gain()?, self.avg_loss()?))
    }
}

/// Convert average gain / loss into an RSI in [0, 100].
///
/// - both zero (flat market): 50
/// - zero average loss: 100
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

/// RSI for every position of `closes`; the first position is always `None`.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    let mut state = RsiState::new(period);
    for (i, &close) in closes.iter().enumerate() {
        if i == 0 {
            out.push(None);
            continue;
        }
        state = state.next(close - closes[i - 1]);
        out.push(state.value());
    }
    out
}
