//! Rotation backtest driver.
//!
//! BacktestConfig defines the rotation parameters; [`run_backtest`] walks
//! the snapshots through the transitions in [`super::rotation`].

use super::error::TrendrankError;
use super::portfolio::{EquityPoint, PortfolioState};
use super::position::TradeEvent;
use super::price_lookup::PriceLookup;
use super::rank_snapshot::RankSnapshot;
use super::rotation;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Slots to fill on each snapshot.
    pub top_n: usize,
    /// Worst rank a holding may fall to before it is exited.
    pub hold_max_rank: usize,
    pub starting_equity: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            top_n: 10,
            hold_max_rank: 20,
            starting_equity: 1.0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), TrendrankError> {
        if self.top_n == 0 {
            return Err(invalid("top_n", "must be at least 1".into()));
        }
        if self.hold_max_rank < self.top_n {
            return Err(invalid(
                "hold_max_rank",
                format!("must be >= top_n ({})", self.top_n),
            ));
        }
        if !(self.starting_equity > 0.0) || !self.starting_equity.is_finite() {
            return Err(invalid("starting_equity", "must be a positive number".into()));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: String) -> TrendrankError {
    TrendrankError::ConfigInvalid {
        section: "backtest".into(),
        key: key.into(),
        reason,
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    /// Trade log in the order the events were produced.
    pub events: Vec<TradeEvent>,
    /// One point per snapshot plus the terminal liquidation point.
    pub equity_curve: Vec<EquityPoint>,
    pub final_state: PortfolioState,
}

impl BacktestResult {
    pub fn final_equity(&self) -> f64 {
        self.final_state.equity
    }
}

/// Run the rotation over `snapshots` (any order; they are walked by date).
///
/// The final liquidation happens at the last date known to `prices`, or at
/// the last snapshot date when that is later.
pub fn run_backtest(
    snapshots: &[RankSnapshot],
    prices: &PriceLookup,
    config: &BacktestConfig,
) -> Result<BacktestResult, TrendrankError> {
    config.validate()?;

    let mut ordered: Vec<&RankSnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.date());
    let (first, rest) = ordered.split_first().ok_or(TrendrankError::NoSnapshots)?;

    let mut events = Vec::new();
    let mut equity_curve = Vec::with_capacity(ordered.len() + 1);

    let (mut state, step) = rotation::initialize(config, first, prices);
    log::debug!("{}: initialized with {} holdings", first.date(), step.point.holdings);
    events.extend(step.events);
    equity_curve.push(step.point);

    for snapshot in rest {
        let (next, step) = rotation::rebalance(state, config, snapshot, prices);
        log::debug!(
            "{}: {} events, equity {:.6}",
            snapshot.date(),
            step.events.len(),
            step.point.equity
        );
        state = next;
        events.extend(step.events);
        equity_curve.push(step.point);
    }

    let last_snapshot = ordered[ordered.len() - 1].date();
    let final_date = prices
        .last_date()
        .map_or(last_snapshot, |d| d.max(last_snapshot));
    let (state, step) = rotation::liquidate(state, final_date, prices);
    events.extend(step.events);
    equity_curve.push(step.point);

    log::info!(
        "backtest complete: {} snapshots, {} events, final equity {:.6}",
        ordered.len(),
        events.len(),
        state.equity
    );

    Ok(BacktestResult {
        events,
        equity_curve,
        final_state: state,
    })
}
