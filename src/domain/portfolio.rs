//! Portfolio state and equity tracking.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::position::Holding;
use super::price_lookup::PriceLookup;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
    pub holdings: usize,
}

/// Cash, last marked equity and open holdings of one backtest run.
///
/// Holdings are keyed by instrument in a `BTreeMap` so that passes over them
/// emit events in a stable order.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub equity: f64,
    pub holdings: BTreeMap<String, Holding>,
}

impl PortfolioState {
    pub fn new(starting_equity: f64) -> Self {
        PortfolioState {
            cash: starting_equity,
            equity: starting_equity,
            holdings: BTreeMap::new(),
        }
    }

    pub fn add_holding(&mut self, holding: Holding) {
        self.holdings.insert(holding.instrument.clone(), holding);
    }

    pub fn get_holding(&self, instrument: &str) -> Option<&Holding> {
        self.holdings.get(instrument)
    }

    pub fn is_held(&self, instrument: &str) -> bool {
        self.holdings.contains_key(instrument)
    }

    pub fn remove_holding(&mut self, instrument: &str) -> Option<Holding> {
        self.holdings.remove(instrument)
    }

    pub fn holding_count(&self) -> usize {
        self.holdings.len()
    }

    /// cash + sum(shares * first price on or after `date`).
    /// A holding without a price on or after `date` is valued at zero.
    pub fn mark_to_market(&self, date: NaiveDate, prices: &PriceLookup) -> f64 {
        let position_value: f64 = self
            .holdings
            .values()
            .filter_map(|h| {
                prices
                    .price_on_or_after(&h.instrument, date)
                    .map(|fill| h.market_value(fill.price))
            })
            .sum();
        self.cash + position_value
    }
}
