//! Rank-hysteresis rotation: the three portfolio transitions.
//!
//! Each transition consumes the previous state and returns the next one
//! together with the events it produced and one equity curve point.
//! Holdings enter when they rank within `top_n` and are only dropped once
//! they fall below `hold_max_rank` or disappear from the ranking.

use chrono::NaiveDate;

use super::backtest::BacktestConfig;
use super::execution::{enter_position, exit_position, EntryResult};
use super::portfolio::{EquityPoint, PortfolioState};
use super::position::TradeEvent;
use super::price_lookup::PriceLookup;
use super::rank_snapshot::RankSnapshot;

/// Output of one transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub events: Vec<TradeEvent>,
    pub point: EquityPoint,
}

/// First snapshot: fund up to `top_n` holdings from starting equity.
pub fn initialize(
    config: &BacktestConfig,
    snapshot: &RankSnapshot,
    prices: &PriceLookup,
) -> (PortfolioState, Step) {
    let mut state = PortfolioState::new(config.starting_equity);
    let allocation = config.starting_equity / config.top_n as f64;
    let events = fill_open_slots(&mut state, snapshot, prices, config.top_n, allocation);
    let point = record_point(&mut state, snapshot.date(), prices);
    (state, Step { events, point })
}

/// Subsequent snapshot: exit pass, then refill at a fresh allocation.
///
/// Steps:
/// 1. Exit every holding ranked worse than `hold_max_rank` or absent
/// 2. If slots are open, mark to market and set allocation = equity / top_n
/// 3. Walk the ranking, entering unheld instruments until `top_n` are held
/// 4. Mark to market and record the curve point
pub fn rebalance(
    mut state: PortfolioState,
    config: &BacktestConfig,
    snapshot: &RankSnapshot,
    prices: &PriceLookup,
) -> (PortfolioState, Step) {
    let date = snapshot.date();

    let to_exit: Vec<String> = state
        .holdings
        .keys()
        .filter(|instrument| {
            snapshot
                .rank_of(instrument)
                .is_none_or(|rank| rank > config.hold_max_rank)
        })
        .cloned()
        .collect();

    let mut events = Vec::new();
    for instrument in &to_exit {
        let score = snapshot.score_of(instrument);
        if let Some(event) = exit_position(&mut state, instrument, date, prices, score) {
            events.push(event);
        }
    }

    if state.holding_count() < config.top_n {
        let equity = state.mark_to_market(date, prices);
        let allocation = equity / config.top_n as f64;
        events.extend(fill_open_slots(
            &mut state,
            snapshot,
            prices,
            config.top_n,
            allocation,
        ));
    }

    let point = record_point(&mut state, date, prices);
    (state, Step { events, point })
}

/// Close every holding at the first price on or after `date`.
///
/// The resulting curve point is dated `date` and carries no holdings.
pub fn liquidate(
    mut state: PortfolioState,
    date: NaiveDate,
    prices: &PriceLookup,
) -> (PortfolioState, Step) {
    let held: Vec<String> = state.holdings.keys().cloned().collect();
    let events = held
        .iter()
        .filter_map(|instrument| exit_position(&mut state, instrument, date, prices, None))
        .collect();
    let point = record_point(&mut state, date, prices);
    (state, Step { events, point })
}

fn fill_open_slots(
    state: &mut PortfolioState,
    snapshot: &RankSnapshot,
    prices: &PriceLookup,
    top_n: usize,
    allocation: f64,
) -> Vec<TradeEvent> {
    let mut events = Vec::new();
    for instrument in snapshot.ordered() {
        if state.holding_count() >= top_n {
            break;
        }
        if state.is_held(instrument) {
            continue;
        }
        let score = snapshot.score_of(instrument);
        match enter_position(state, instrument, allocation, snapshot.date(), prices, score) {
            EntryResult::Entered(event) => events.push(event),
            EntryResult::NoPrice => {}
            EntryResult::InsufficientCash => break,
        }
    }
    events
}

fn record_point(state: &mut PortfolioState, date: NaiveDate, prices: &PriceLookup) -> EquityPoint {
    state.equity = state.mark_to_market(date, prices);
    EquityPoint {
        date,
        equity: state.equity,
        holdings: state.holding_count(),
    }
}
