//! Performance metrics for a rotation backtest.

use super::portfolio::EquityPoint;
use super::position::TradeEvent;

const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    /// Longest run of curve points spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub closed_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    /// Mean realized return of filled exits, in percent.
    pub avg_return_pct: f64,
    pub best_return_pct: f64,
    pub worst_return_pct: f64,
    pub unfilled_exits: usize,
}

impl Metrics {
    pub fn compute(equity_curve: &[EquityPoint], events: &[TradeEvent], starting_equity: f64) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(starting_equity);

        let total_return = if starting_equity > 0.0 {
            (final_equity - starting_equity) / starting_equity
        } else {
            0.0
        };

        let days = match (equity_curve.first(), equity_curve.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days() as f64,
            _ => 0.0,
        };
        let years = days / DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let exits: Vec<&TradeEvent> = events.iter().filter(|e| e.is_exit()).collect();
        let returns: Vec<f64> = exits.iter().filter_map(|e| e.return_pct).collect();
        let unfilled_exits = exits.len() - returns.len();

        let trades_won = returns.iter().filter(|&&r| r > 0.0).count();
        let trades_lost = returns.iter().filter(|&&r| r < 0.0).count();
        let win_rate = if returns.is_empty() {
            0.0
        } else {
            trades_won as f64 / returns.len() as f64
        };

        let avg_return_pct = if returns.is_empty() {
            0.0
        } else {
            returns.iter().sum::<f64>() / returns.len() as f64
        };
        let best_return_pct = returns.iter().copied().reduce(f64::max).unwrap_or(0.0);
        let worst_return_pct = returns.iter().copied().reduce(f64::min).unwrap_or(0.0);

        Metrics {
            total_return,
            annualized_return,
            max_drawdown,
            max_drawdown_duration,
            closed_trades: exits.len(),
            trades_won,
            trades_lost,
            win_rate,
            avg_return_pct,
            best_return_pct,
            worst_return_pct,
            unfilled_exits,
        }
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    if equity_curve.is_empty() {
        return (0.0, 0);
    }

    let mut peak = equity_curve[0].equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}
