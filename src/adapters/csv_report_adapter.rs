//! CSV report adapter.
//!
//! Writes rankings, ticker coverage, the trade log and the equity curve as
//! plain CSV. Missing values are written as empty cells.

use crate::domain::error::TrendrankError;
use crate::domain::portfolio::EquityPoint;
use crate::domain::position::TradeEvent;
use crate::domain::score::ScoreTable;
use crate::domain::universe::Coverage;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize)]
struct RankingRow<'a> {
    date: String,
    rank: usize,
    ticker: &'a str,
    score: f64,
    m6: f64,
    m12: f64,
    sma_norm: f64,
    va_raw: f64,
}

#[derive(Debug, Serialize)]
struct CoverageRow<'a> {
    ticker: &'a str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    date: String,
    ticker: &'a str,
    action: String,
    price: Option<f64>,
    score: Option<f64>,
    trade_return_pct: Option<f64>,
}

#[derive(Debug, Serialize)]
struct EquityRow {
    date: String,
    equity: f64,
    holdings: usize,
}

/// Rankings are truncated to the best `top_k` rows per date.
pub struct CsvReportAdapter {
    top_k: usize,
}

impl CsvReportAdapter {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new(30)
    }
}

fn write_rows<T, I>(path: &Path, rows: I) -> Result<(), TrendrankError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let output_err = |reason: String| TrendrankError::Output {
        path: path.display().to_string(),
        reason,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| output_err(e.to_string()))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| output_err(e.to_string()))?;
    for row in rows {
        writer.serialize(row).map_err(|e| output_err(e.to_string()))?;
    }
    writer.flush().map_err(|e| output_err(e.to_string()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write_rankings(&self, path: &Path, tables: &[ScoreTable]) -> Result<(), TrendrankError> {
        let rows = tables.iter().flat_map(|table| {
            table.rows.iter().take(self.top_k).map(move |row| RankingRow {
                date: table.date.to_string(),
                rank: row.rank,
                ticker: &row.instrument,
                score: row.score,
                m6: row.factors.m6,
                m12: row.factors.m12,
                sma_norm: row.factors.sma_norm,
                va_raw: row.factors.va_raw,
            })
        });
        write_rows(path, rows)
    }

    fn write_coverage(
        &self,
        path: &Path,
        coverage: &[(String, Coverage)],
    ) -> Result<(), TrendrankError> {
        let rows = coverage.iter().map(|(ticker, status)| CoverageRow {
            ticker,
            status: status.as_str(),
        });
        write_rows(path, rows)
    }

    fn write_trades(&self, path: &Path, events: &[TradeEvent]) -> Result<(), TrendrankError> {
        let rows = events.iter().map(|e| TradeRow {
            date: e.date.to_string(),
            ticker: &e.instrument,
            action: e.action.to_string(),
            price: e.price,
            score: e.score,
            trade_return_pct: e.return_pct,
        });
        write_rows(path, rows)
    }

    fn write_equity(&self, path: &Path, curve: &[EquityPoint]) -> Result<(), TrendrankError> {
        let rows = curve.iter().map(|p| EquityRow {
            date: p.date.to_string(),
            equity: p.equity,
            holdings: p.holdings,
        });
        write_rows(path, rows)
    }
}
