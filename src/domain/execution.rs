//! Fill simulation for rotation entries and exits.
//!
//! Fills come from the price lookup (first close on or after the signal
//! date). Positions are fractional: shares = spend / fill price.

use chrono::NaiveDate;

use super::portfolio::PortfolioState;
use super::position::{Holding, TradeEvent};
use super::price_lookup::PriceLookup;

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered(TradeEvent),
    /// No usable price on or after the signal date; the instrument is skipped.
    NoPrice,
    /// No cash left to fund the slot.
    InsufficientCash,
}

/// Open a position worth `allocation`, capped at the available cash.
///
/// Steps:
/// 1. Look up the fill; skip when none exists or the price is not positive
/// 2. spend = min(allocation, cash); skip when nothing can be spent
/// 3. Deduct spend from cash and record the holding at the fill price
pub fn enter_position(
    portfolio: &mut PortfolioState,
    instrument: &str,
    allocation: f64,
    date: NaiveDate,
    prices: &PriceLookup,
    score: Option<f64>,
) -> EntryResult {
    let fill = match prices.price_on_or_after(instrument, date) {
        Some(fill) if fill.price > 0.0 && fill.price.is_finite() => fill,
        _ => {
            log::debug!("{date}: no entry price for {instrument}, skipping");
            return EntryResult::NoPrice;
        }
    };

    let spend = allocation.min(portfolio.cash);
    if !(spend > 0.0) {
        return EntryResult::InsufficientCash;
    }

    portfolio.cash -= spend;
    portfolio.add_holding(Holding {
        instrument: instrument.to_string(),
        shares: spend / fill.price,
        entry_price: fill.price,
        entry_date: fill.date,
    });

    EntryResult::Entered(TradeEvent::entry(fill.date, instrument, fill.price, score))
}

/// Close a position.
///
/// The holding is always removed. With a fill the proceeds are credited to
/// cash and the event carries the realized return; without one the event is
/// recorded unfilled and the position is written off at zero proceeds.
/// Returns `None` when the instrument was not held.
pub fn exit_position(
    portfolio: &mut PortfolioState,
    instrument: &str,
    date: NaiveDate,
    prices: &PriceLookup,
    score: Option<f64>,
) -> Option<TradeEvent> {
    let holding = portfolio.remove_holding(instrument)?;

    match prices.price_on_or_after(instrument, date) {
        Some(fill) => {
            portfolio.cash += holding.market_value(fill.price);
            Some(TradeEvent::exit(fill.date, &holding, fill.price, score))
        }
        None => {
            log::warn!("{date}: no exit price for {instrument}, closing unfilled");
            Some(TradeEvent::unfilled_exit(date, &holding, score))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::TradeAction;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn prices() -> PriceLookup {
        PriceLookup::from_samples(vec![
            ("AAPL".to_string(), vec![(d(2024, 1, 5), 100.0), (d(2024, 1, 12), 120.0)]),
            ("ZERO".to_string(), vec![(d(2024, 1, 5), 0.0)]),
        ])
    }

    #[test]
    fn enter_deducts_cash_and_records_holding() {
        let mut p = PortfolioState::new(1000.0);
        let result = enter_position(&mut p, "AAPL", 250.0, d(2024, 1, 4), &prices(), Some(0.8));

        let EntryResult::Entered(event) = result else {
            panic!("expected entry");
        };
        assert_eq!(event.date, d(2024, 1, 5));
        assert_eq!(event.price, Some(100.0));
        assert_eq!(event.score, Some(0.8));
        assert!((p.cash - 750.0).abs() < 1e-9);
        let h = p.get_holding("AAPL").unwrap();
        assert!((h.shares - 2.5).abs() < 1e-12);
        assert_eq!(h.entry_date, d(2024, 1, 5));
    }

    #[test]
    fn enter_caps_spend_at_cash() {
        let mut p = PortfolioState::new(100.0);
        p.cash = 40.0;
        enter_position(&mut p, "AAPL", 250.0, d(2024, 1, 5), &prices(), None);
        assert_eq!(p.cash, 0.0);
        assert!((p.get_holding("AAPL").unwrap().shares - 0.4).abs() < 1e-12);
    }

    #[test]
    fn enter_without_price_is_skipped() {
        let mut p = PortfolioState::new(100.0);
        let pr = prices();
        assert_eq!(
            enter_position(&mut p, "MSFT", 10.0, d(2024, 1, 5), &pr, None),
            EntryResult::NoPrice
        );
        assert_eq!(
            enter_position(&mut p, "AAPL", 10.0, d(2024, 2, 1), &pr, None),
            EntryResult::NoPrice
        );
        assert_eq!(
            enter_position(&mut p, "ZERO", 10.0, d(2024, 1, 5), &pr, None),
            EntryResult::NoPrice
        );
        assert_eq!(p.cash, 100.0);
        assert_eq!(p.holding_count(), 0);
    }

    #[test]
    fn enter_with_no_cash() {
        let mut p = PortfolioState::new(0.0);
        assert_eq!(
            enter_position(&mut p, "AAPL", 10.0, d(2024, 1, 5), &prices(), None),
            EntryResult::InsufficientCash
        );
    }

    #[test]
    fn exit_credits_proceeds() {
        let mut p = PortfolioState::new(100.0);
        let pr = prices();
        enter_position(&mut p, "AAPL", 100.0, d(2024, 1, 5), &pr, None);

        let event = exit_position(&mut p, "AAPL", d(2024, 1, 8), &pr, Some(0.1)).unwrap();
        assert_eq!(event.action, TradeAction::Exit);
        assert_eq!(event.date, d(2024, 1, 12));
        assert_eq!(event.price, Some(120.0));
        assert!((event.return_pct.unwrap() - 20.0).abs() < 1e-9);
        assert!((p.cash - 120.0).abs() < 1e-9);
        assert!(!p.is_held("AAPL"));
    }

    #[test]
    fn exit_without_price_removes_holding() {
        let mut p = PortfolioState::new(100.0);
        let pr = prices();
        enter_position(&mut p, "AAPL", 100.0, d(2024, 1, 5), &pr, None);

        let event = exit_position(&mut p, "AAPL", d(2024, 3, 1), &pr, None).unwrap();
        assert_eq!(event.price, None);
        assert_eq!(event.date, d(2024, 3, 1));
        assert_eq!(p.holding_count(), 0);
        assert_eq!(p.cash, 0.0);
    }

    #[test]
    fn exit_not_held() {
        let mut p = PortfolioState::new(100.0);
        assert!(exit_position(&mut p, "AAPL", d(2024, 1, 5), &prices(), None).is_none());
    }
}
