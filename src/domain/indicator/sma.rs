//! Simple Moving Average and moving-average structure.
//!
//! SMA(n) = sum(C[last-n+1..=last]) / n
//! Undefined when fewer than n values exist or any of them is missing.

pub fn sma(values: &[Option<f64>], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    let mut sum = 0.0;
    for v in window {
        sum += (*v)?;
    }
    Some(sum / period as f64)
}

/// Count of {last>short, last>mid, last>long, short>mid, mid>long}, scaled to [0, 1].
pub fn sma_structure(last: f64, short: f64, mid: f64, long: f64) -> f64 {
    let points = [
        last > short,
        last > mid,
        last > long,
        short > mid,
        mid > long,
    ]
    .iter()
    .filter(|&&held| held)
    .count();
    points as f64 / 5.0
}
