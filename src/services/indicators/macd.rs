//! MACD (Moving Average Convergence Divergence).

use super::ema::Ema;

/// MACD running state.
///
/// - MACD line = EMA(fast) - EMA(slow)
/// - Signal line = EMA(signal) of the MACD line
///
/// All three EMAs are seeded on the first close, so the MACD line starts at
/// zero and converges as history accumulates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdState {
    fast: Ema,
    slow: Ema,
    signal: Ema,
}

impl Default for MacdState {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

impl MacdState {
    pub fn new(fast_span: usize, slow_span: usize, signal_span: usize) -> Self {
        Self {
            fast: Ema::with_span(fast_span),
            slow: Ema::with_span(slow_span),
            signal: Ema::with_span(signal_span),
        }
    }

    #[must_use]
    pub fn next(self, close: f64) -> Self {
        let fast = self.fast.next(close);
        let slow = self.slow.next(close);
        let macd = match (fast.value(), slow.value()) {
            (Some(f), Some(s)) => f - s,
            _ => 0.0,
        };
        Self {
            fast,
            slow,
            signal: self.signal.next(macd),
        }
    }

    pub fn macd(&self) -> Option<f64> {
        Some(self.fast.value()? - self.slow.value()?)
    }

    pub fn signal(&self) -> Option<f64> {
        self.signal.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(closes: &[f64]) -> MacdState {
        closes
            .iter()
            .fold(MacdState::default(), |state, &close| state.next(close))
    }

    #[test]
    fn test_macd_empty_state() {
        let state = MacdState::default();
        assert!(state.macd().is_none());
        assert!(state.signal().is_none());
    }

    #[test]
    fn test_macd_first_point_is_zero() {
        let state = run(&[100.0]);
        assert_eq!(state.macd(), Some(0.0));
        assert_eq!(state.signal(), Some(0.0));
    }

    #[test]
    fn test_macd_flat_series_stays_zero() {
        let state = run(&[50.0; 80]);
        assert!(state.macd().unwrap().abs() < 1e-12);
        assert!(state.signal().unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_macd_uptrend_above_signal() {
        let closes: Vec<f64> = (1..=60).map(|i| 100.0 + i as f64).collect();
        let state = run(&closes);
        let macd = state.macd().unwrap();
        let signal = state.signal().unwrap();
        assert!(macd > 0.0, "macd {macd}");
        assert!(macd > signal, "macd {macd} signal {signal}");
    }

    #[test]
    fn test_macd_downtrend_below_zero() {
        let closes: Vec<f64> = (1..=60).map(|i| 200.0 - i as f64).collect();
        let state = run(&closes);
        assert!(state.macd().unwrap() < 0.0);
        assert!(state.signal().unwrap() < 0.0);
    }
}
