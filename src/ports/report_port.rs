//! Output port trait for scoring and backtest results.

use crate::domain::error::TrendrankError;
use crate::domain::portfolio::EquityPoint;
use crate::domain::position::TradeEvent;
use crate::domain::score::ScoreTable;
use crate::domain::universe::Coverage;
use std::path::Path;

pub trait ReportPort {
    fn write_rankings(&self, path: &Path, tables: &[ScoreTable]) -> Result<(), TrendrankError>;

    fn write_coverage(
        &self,
        path: &Path,
        coverage: &[(String, Coverage)],
    ) -> Result<(), TrendrankError>;

    fn write_trades(&self, path: &Path, events: &[TradeEvent]) -> Result<(), TrendrankError>;

    fn write_equity(&self, path: &Path, curve: &[EquityPoint]) -> Result<(), TrendrankError>;
}
