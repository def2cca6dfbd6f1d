//! CSV price directory adapter.
//!
//! One file per instrument, `<dir>/<TICKER>.csv`, with a header row naming at
//! least `date` and `close` (matched case-insensitively). `high` and `low`
//! are optional; empty cells are missing values.

use crate::domain::error::TrendrankError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `<dir>/<instrument>.csv`, falling back to a file whose stem matches
    /// the instrument case-insensitively (`aapl.csv` serves `AAPL`).
    fn csv_path(&self, instrument: &str) -> PathBuf {
        let exact = self.base_path.join(format!("{}.csv", instrument));
        if exact.is_file() {
            return exact;
        }
        let Ok(entries) = fs::read_dir(&self.base_path) else {
            return exact;
        };
        entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                path.extension().is_some_and(|ext| ext == "csv")
                    && path
                        .file_stem()
                        .and_then(|stem| stem.to_str())
                        .is_some_and(|stem| stem.eq_ignore_ascii_case(instrument))
            })
            .unwrap_or(exact)
    }
}

struct Columns {
    date: usize,
    close: usize,
    high: Option<usize>,
    low: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, source: &str) -> Result<Self, TrendrankError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| TrendrankError::MissingColumn {
                source_name: source.to_string(),
                column: name.to_string(),
            })
        };
        Ok(Columns {
            date: required("date")?,
            close: required("close")?,
            high: find("high"),
            low: find("low"),
        })
    }
}

fn parse_cell(record: &csv::StringRecord, index: Option<usize>) -> Option<f64> {
    let raw = record.get(index?)?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        instrument: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TrendrankError> {
        let path = self.csv_path(instrument);
        let source = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TrendrankError::NoData {
                instrument: instrument.to_string(),
            },
            _ => TrendrankError::Data {
                source_name: source.clone(),
                reason: e.to_string(),
            },
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| TrendrankError::Data {
            source_name: source.clone(),
            reason: format!("CSV parse error: {}", e),
        })?;
        let columns = Columns::from_headers(headers, &source)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| TrendrankError::Data {
                source_name: source.clone(),
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(columns.date).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                TrendrankError::Data {
                    source_name: source.clone(),
                    reason: format!("invalid date '{}': {}", date_str, e),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            let Some(close) = parse_cell(&record, Some(columns.close)) else {
                log::debug!("{instrument} {date}: no close, row skipped");
                continue;
            };

            bars.push(PriceBar {
                instrument: instrument.to_string(),
                date,
                high: parse_cell(&record, columns.high),
                low: parse_cell(&record, columns.low),
                close,
            });
        }

        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_instruments(&self) -> Result<Vec<String>, TrendrankError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TrendrankError::Data {
            source_name: self.base_path.display().to_string(),
            reason: format!("failed to read directory: {}", e),
        })?;

        let mut instruments = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".csv") {
                if !stem.is_empty() {
                    instruments.push(stem.to_uppercase());
                }
            }
        }

        instruments.sort();
        instruments.dedup();
        Ok(instruments)
    }
}
