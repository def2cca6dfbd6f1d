//! Price momentum over a lookback window.
//!
//! MOM(n) = C[last] / C[len-n] - 1, so a window of n samples spans n-1 steps.
//! Undefined when either endpoint is missing or the base price is zero.

pub fn momentum(closes: &[Option<f64>], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let last = (*closes.last()?)?;
    let base = closes[closes.len() - period]?;
    if base == 0.0 {
        return None;
    }
    Some(last / base - 1.0)
}
