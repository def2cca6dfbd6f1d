//! CSV rank input adapter.
//!
//! Reads `{date, rank, instrument, score}` rows. Header names are matched
//! case-insensitively and accept the spreadsheet aliases `WeekEnd`, `Ticker`.

use crate::domain::error::TrendrankError;
use crate::domain::rank_snapshot::RankRow;
use crate::ports::rank_port::RankPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const DATE_ALIASES: &[&str] = &["date", "weekend", "week_end"];
const RANK_ALIASES: &[&str] = &["rank"];
const INSTRUMENT_ALIASES: &[&str] = &["instrument", "ticker", "symbol"];
const SCORE_ALIASES: &[&str] = &["score", "trendscore"];

pub struct RankCsvAdapter {
    path: PathBuf,
}

impl RankCsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn find_column(
    headers: &csv::StringRecord,
    aliases: &[&str],
    source: &str,
) -> Result<usize, TrendrankError> {
    headers
        .iter()
        .position(|h| {
            let h = h.trim();
            aliases.iter().any(|a| h.eq_ignore_ascii_case(a))
        })
        .ok_or_else(|| TrendrankError::MissingColumn {
            source_name: source.to_string(),
            column: aliases[0].to_string(),
        })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Accepts integral values written as floats ("3.0").
fn parse_rank(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    if let Ok(rank) = raw.parse::<usize>() {
        return (rank > 0).then_some(rank);
    }
    let value = raw.parse::<f64>().ok()?;
    (value >= 1.0 && value.fract() == 0.0 && value.is_finite()).then_some(value as usize)
}

fn parse_row(record: &csv::StringRecord, cols: [usize; 4]) -> Option<RankRow> {
    let [date_col, rank_col, instrument_col, score_col] = cols;
    let date = parse_date(record.get(date_col)?)?;
    let rank = parse_rank(record.get(rank_col)?)?;
    let instrument = record.get(instrument_col)?.trim().to_uppercase();
    if instrument.is_empty() {
        return None;
    }
    let score = record
        .get(score_col)?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())?;
    Some(RankRow {
        date,
        rank,
        instrument,
        score,
    })
}

impl RankPort for RankCsvAdapter {
    fn load_rank_rows(&self) -> Result<Vec<RankRow>, TrendrankError> {
        let source = self.path.display().to_string();
        let content = fs::read_to_string(&self.path).map_err(|e| TrendrankError::Data {
            source_name: source.clone(),
            reason: e.to_string(),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| TrendrankError::Data {
            source_name: source.clone(),
            reason: format!("CSV parse error: {}", e),
        })?;
        let cols = [
            find_column(headers, DATE_ALIASES, &source)?,
            find_column(headers, RANK_ALIASES, &source)?,
            find_column(headers, INSTRUMENT_ALIASES, &source)?,
            find_column(headers, SCORE_ALIASES, &source)?,
        ];

        let mut rows = Vec::new();
        let mut dropped = 0usize;
        for (line, result) in rdr.records().enumerate() {
            let parsed = result.ok().and_then(|record| parse_row(&record, cols));
            match parsed {
                Some(row) => rows.push(row),
                None => {
                    dropped += 1;
                    log::debug!("{source}: dropping unusable row {}", line + 2);
                }
            }
        }

        if dropped > 0 {
            log::info!("{source}: dropped {dropped} unusable rows");
        }
        if rows.is_empty() {
            return Err(TrendrankError::EmptyRankInput {
                source_name: source,
            });
        }
        Ok(rows)
    }
}
