//! Average True Range over a simple rolling window.
//!
//! TR[i] = max(H[i]-L[i], |H[i]-C[i-1]|, |L[i]-C[i-1]|)
//! ATR(n) = mean(TR over the last n rows)
//! This is a plain rolling mean, not Wilder smoothing.

use crate::domain::ohlcv::true_range;

pub fn average_true_range(
    highs: &[Option<f64>],
    lows: &[Option<f64>],
    closes: &[Option<f64>],
    period: usize,
) -> Option<f64> {
    let len = closes.len();
    if period == 0 || len < period || highs.len() != len || lows.len() != len {
        return None;
    }

    let mut sum = 0.0;
    for i in len - period..len {
        let prev_close = if i == 0 { None } else { closes[i - 1] };
        sum += true_range(highs[i], lows[i], prev_close)?;
    }
    Some(sum / period as f64)
}
