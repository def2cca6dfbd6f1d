//! Trend score engine.
//!
//! Scores every instrument of a universe as of one date and ranks them by a
//! composite of 6M/12M momentum, moving-average structure and
//! volatility-adjusted momentum. Scoring is pure: it reads the price panel and
//! never mutates it.

use crate::domain::indicator::{average_true_range, momentum, percentile_ranks, sma, sma_structure};
use crate::domain::price_history::{PriceColumns, PriceHistory};
use crate::domain::rank_snapshot::RankSnapshot;
use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;

/// Sampling cadence of the price panel the engine scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Daily,
    Weekly,
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Daily => write!(f, "daily"),
            Cadence::Weekly => write!(f, "weekly"),
        }
    }
}

impl FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "d" => Ok(Cadence::Daily),
            "weekly" | "w" => Ok(Cadence::Weekly),
            other => Err(format!("unknown cadence '{other}' (expected daily or weekly)")),
        }
    }
}

/// Composite score weights. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub m6: f64,
    pub m12: f64,
    pub sma: f64,
    pub vol_adj: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            m6: 0.33,
            m12: 0.33,
            sma: 0.20,
            vol_adj: 0.14,
        }
    }
}

impl ScoreWeights {
    pub const SUM_TOLERANCE: f64 = 1e-9;

    pub fn sum(&self) -> f64 {
        self.m6 + self.m12 + self.sma + self.vol_adj
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= Self::SUM_TOLERANCE
    }

    pub fn composite(&self, rank_m6: f64, rank_m12: f64, sma_norm: f64, rank_va: f64) -> f64 {
        self.m6 * rank_m6 + self.m12 * rank_m12 + self.sma * sma_norm + self.vol_adj * rank_va
    }
}

/// Lookback windows, counted in samples of the panel's cadence.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreParams {
    pub cadence: Cadence,
    pub lookback: usize,
    pub m6_period: usize,
    pub m12_period: usize,
    pub sma_short: usize,
    pub sma_mid: usize,
    pub sma_long: usize,
    pub atr_window: usize,
    pub weights: ScoreWeights,
}

impl ScoreParams {
    pub fn daily() -> Self {
        ScoreParams {
            cadence: Cadence::Daily,
            lookback: 252,
            m6_period: 126,
            m12_period: 252,
            sma_short: 50,
            sma_mid: 100,
            sma_long: 200,
            atr_window: 20,
            weights: ScoreWeights::default(),
        }
    }

    pub fn weekly() -> Self {
        ScoreParams {
            cadence: Cadence::Weekly,
            lookback: 52,
            m6_period: 26,
            m12_period: 52,
            sma_short: 10,
            sma_mid: 20,
            sma_long: 40,
            atr_window: 10,
            weights: ScoreWeights::default(),
        }
    }

    pub fn for_cadence(cadence: Cadence) -> Self {
        match cadence {
            Cadence::Daily => Self::daily(),
            Cadence::Weekly => Self::weekly(),
        }
    }

    /// Longest window any factor reads. ATR needs one extra row for the
    /// previous close.
    pub fn max_window(&self) -> usize {
        [
            self.m6_period,
            self.m12_period,
            self.sma_short,
            self.sma_mid,
            self.sma_long,
            self.atr_window + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Visible rows an evaluation date needs: the lookback, stretched to
    /// cover a factor window longer than it.
    pub fn required_rows(&self) -> usize {
        self.lookback.max(self.max_window())
    }
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self::daily()
    }
}

/// Raw factor values for one instrument on one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factors {
    pub m6: f64,
    pub m12: f64,
    pub sma_norm: f64,
    pub va_raw: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredInstrument {
    pub instrument: String,
    pub rank: usize,
    pub score: f64,
    pub factors: Factors,
}

/// Ranked, fully-scored universe for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    pub date: NaiveDate,
    pub rows: Vec<ScoredInstrument>,
}

impl ScoreTable {
    pub fn snapshot(&self) -> RankSnapshot {
        RankSnapshot::from_scores(
            self.date,
            self.rows
                .iter()
                .map(|r| (r.instrument.clone(), r.score))
                .collect(),
        )
    }

    pub fn top(&self, k: usize) -> Self {
        ScoreTable {
            date: self.date,
            rows: self.rows.iter().take(k).cloned().collect(),
        }
    }
}

/// Score `universe` as of `as_of_date` and rank it.
///
/// Returns `None` when fewer than `params.required_rows()` panel rows are
/// visible or when no instrument survives the completeness and factor checks.
pub fn score_universe(
    history: &PriceHistory,
    as_of_date: NaiveDate,
    universe: &[String],
    params: &ScoreParams,
) -> Option<ScoreTable> {
    let rows = history.rows_through(as_of_date);
    let needed = params.required_rows();
    if rows < needed {
        log::debug!("{as_of_date}: {rows} rows of history, need {needed}; no snapshot");
        return None;
    }

    let mut candidates: Vec<(&str, Factors)> = Vec::new();
    for instrument in universe {
        let Some(cols) = history.columns(instrument) else {
            continue;
        };
        if !has_complete_window(&cols.close[..rows], needed) {
            log::debug!("{as_of_date}: {instrument} has a gap in its lookback window");
            continue;
        }
        match compute_factors(cols, rows, params) {
            Some(f) => candidates.push((instrument.as_str(), f)),
            None => log::debug!("{as_of_date}: {instrument} has an undefined factor"),
        }
    }

    if candidates.is_empty() {
        return None;
    }

    let rank_m6 = percentile_ranks(&candidates.iter().map(|(_, f)| f.m6).collect::<Vec<_>>());
    let rank_m12 = percentile_ranks(&candidates.iter().map(|(_, f)| f.m12).collect::<Vec<_>>());
    let rank_va = percentile_ranks(&candidates.iter().map(|(_, f)| f.va_raw).collect::<Vec<_>>());

    let mut scored: Vec<ScoredInstrument> = candidates
        .iter()
        .enumerate()
        .map(|(i, (instrument, factors))| ScoredInstrument {
            instrument: instrument.to_string(),
            rank: 0,
            score: params
                .weights
                .composite(rank_m6[i], rank_m12[i], factors.sma_norm, rank_va[i]),
            factors: *factors,
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.instrument.cmp(&b.instrument))
    });
    for (i, row) in scored.iter_mut().enumerate() {
        row.rank = i + 1;
    }

    Some(ScoreTable {
        date: as_of_date,
        rows: scored,
    })
}

/// Rank snapshot for one date; `None` is the expected "not enough history"
/// outcome, never a failure.
pub fn compute_score_snapshot(
    history: &PriceHistory,
    as_of_date: NaiveDate,
    universe: &[String],
    params: &ScoreParams,
) -> Option<RankSnapshot> {
    score_universe(history, as_of_date, universe, params).map(|t| t.snapshot())
}

fn has_complete_window(closes: &[Option<f64>], lookback: usize) -> bool {
    closes.len() >= lookback && closes[closes.len() - lookback..].iter().all(Option::is_some)
}

fn compute_factors(cols: &PriceColumns, rows: usize, params: &ScoreParams) -> Option<Factors> {
    let closes = &cols.close[..rows];
    let last = (*closes.last()?)?;
    if last == 0.0 {
        return None;
    }

    let m6 = momentum(closes, params.m6_period)?;
    let m12 = momentum(closes, params.m12_period)?;

    let short = sma(closes, params.sma_short)?;
    let mid = sma(closes, params.sma_mid)?;
    let long = sma(closes, params.sma_long)?;
    let sma_norm = sma_structure(last, short, mid, long);

    let atr = average_true_range(&cols.high[..rows], &cols.low[..rows], closes, params.atr_window)?;
    let vol = atr / last;
    if vol == 0.0 || !vol.is_finite() {
        return None;
    }
    let va_raw = m12 / vol;

    [m6, m12, sma_norm, va_raw]
        .iter()
        .all(|v| v.is_finite())
        .then_some(Factors {
            m6,
            m12,
            sma_norm,
            va_raw,
        })
}

/// Dates in `[scan_start, scan_end]` on which the engine is evaluated.
///
/// Daily panels are evaluated on Fridays; weekly panels on every week-end row.
pub fn evaluation_dates(
    history: &PriceHistory,
    scan_start: NaiveDate,
    scan_end: NaiveDate,
    cadence: Cadence,
) -> Vec<NaiveDate> {
    history
        .dates()
        .iter()
        .copied()
        .filter(|d| *d >= scan_start && *d <= scan_end)
        .filter(|d| cadence == Cadence::Weekly || d.weekday() == Weekday::Fri)
        .collect()
}

/// Score every evaluation date in the scan window, ascending by date.
///
/// A daily panel is resampled to weeks first when `params.cadence` is weekly.
/// Dates without enough history are skipped.
pub fn compute_score_tables(
    history: &PriceHistory,
    universe: &[String],
    params: &ScoreParams,
    scan_start: NaiveDate,
    scan_end: NaiveDate,
) -> Vec<ScoreTable> {
    let resampled;
    let panel = match params.cadence {
        Cadence::Daily => history,
        Cadence::Weekly => {
            resampled = history.resample_weekly();
            &resampled
        }
    };

    let dates = evaluation_dates(panel, scan_start, scan_end, params.cadence);
    log::info!(
        "scoring {} instruments on {} {} evaluation dates",
        universe.len(),
        dates.len(),
        params.cadence
    );

    dates
        .into_iter()
        .filter_map(|d| score_universe(panel, d, universe, params))
        .collect()
}

/// Rank snapshots for every evaluation date in the scan window.
pub fn compute_snapshots(
    history: &PriceHistory,
    universe: &[String],
    params: &ScoreParams,
    scan_start: NaiveDate,
    scan_end: NaiveDate,
) -> Vec<RankSnapshot> {
    compute_score_tables(history, universe, params, scan_start, scan_end)
        .iter()
        .map(ScoreTable::snapshot)
        .collect()
}
