//! Rate of Change over a raw price series.
//!
//! ROC[t] = (price[t] - price[t-period]) / price[t-period] * 100
//! Lookback: period.

/// Compute ROC values from a price slice. The first `period` outputs are
/// `f64::NAN`.
pub fn roc_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }

    for i in period..n {
        let prev = values[i - period];
        let curr = values[i];
        if prev.is_nan() || curr.is_nan() || prev == 0.0 {
            result[i] = f64::NAN;
        } else {
            result[i] = (curr - prev) / prev * 100.0;
        }
    }

    result
}
