//! Open holdings and the trade events that open and close them.

use chrono::NaiveDate;
use std::fmt;

/// An open long position. Shares are always strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub instrument: String,
    pub shares: f64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Holding {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    /// (exit / entry - 1) * 100
    pub fn realized_return_pct(&self, exit_price: f64) -> f64 {
        (exit_price / self.entry_price - 1.0) * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Entry,
    Exit,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Entry => write!(f, "ENTRY"),
            TradeAction::Exit => write!(f, "EXIT"),
        }
    }
}

/// One line of the append-only trade log.
///
/// `price` is `None` only for an exit whose fill could not be found; such an
/// event also has no realized return.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub date: NaiveDate,
    pub instrument: String,
    pub action: TradeAction,
    pub price: Option<f64>,
    pub score: Option<f64>,
    pub return_pct: Option<f64>,
}

impl TradeEvent {
    pub fn entry(date: NaiveDate, instrument: &str, price: f64, score: Option<f64>) -> Self {
        TradeEvent {
            date,
            instrument: instrument.to_string(),
            action: TradeAction::Entry,
            price: Some(price),
            score,
            return_pct: None,
        }
    }

    pub fn exit(date: NaiveDate, holding: &Holding, price: f64, score: Option<f64>) -> Self {
        TradeEvent {
            date,
            instrument: holding.instrument.clone(),
            action: TradeAction::Exit,
            price: Some(price),
            score,
            return_pct: Some(holding.realized_return_pct(price)),
        }
    }

    /// Exit recorded without a fill: the position is closed at zero proceeds.
    pub fn unfilled_exit(date: NaiveDate, holding: &Holding, score: Option<f64>) -> Self {
        TradeEvent {
            date,
            instrument: holding.instrument.clone(),
            action: TradeAction::Exit,
            price: None,
            score,
            return_pct: None,
        }
    }

    pub fn is_entry(&self) -> bool {
        self.action == TradeAction::Entry
    }

    pub fn is_exit(&self) -> bool {
        self.action == TradeAction::Exit
    }
}
