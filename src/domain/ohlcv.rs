//! Daily price bar representation.

use chrono::NaiveDate;

/// One sample of an instrument's price series.
///
/// `close` is required; bars without a close are dropped at load time.
/// `high`/`low` may be missing, which later makes the true range partial.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub instrument: String,
    pub date: NaiveDate,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
}

impl PriceBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|) over the
    /// components that are available.
    pub fn true_range(&self, prev_close: Option<f64>) -> Option<f64> {
        true_range(self.high, self.low, prev_close)
    }
}

/// True range from optional components. Missing components are skipped;
/// `None` only when no component can be formed.
pub fn true_range(high: Option<f64>, low: Option<f64>, prev_close: Option<f64>) -> Option<f64> {
    let hl = match (high, low) {
        (Some(h), Some(l)) => Some(h - l),
        _ => None,
    };
    let hc = match (high, prev_close) {
        (Some(h), Some(c)) => Some((h - c).abs()),
        _ => None,
    };
    let lc = match (low, prev_close) {
        (Some(l), Some(c)) => Some((l - c).abs()),
        _ => None,
    };
    [hl, hc, lc].into_iter().flatten().reduce(f64::max)
}
