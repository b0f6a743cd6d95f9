//! Simple moving average (SMA).

/// Mean of the `window` values ending at `end` (inclusive).
///
/// `None` while `end < window - 1`, i.e. before a full window exists, and
/// for a zero window.
pub fn sma_at(values: &[f64], end: usize, window: usize) -> Option<f64> {
    if window == 0 || end >= values.len() || end + 1 < window {
        return None;
    }
    let slice = &values[end + 1 - window..=end];
    Some(slice.iter().sum::<f64>() / window as f64)
}

/// SMA for every position of `values`.
pub fn sma_series(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len()).map(|i| sma_at(values, i, window)).collect()
}
