//! Instrument universe.
//!
//! Parses ticker lists from configuration and loads each ticker's history
//! through the data port, recording which tickers could be loaded.

use crate::domain::error::TrendrankError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::BTreeSet;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("ticker list is empty")]
    Empty,

    #[error("invalid ticker '{0}'")]
    InvalidTicker(String),
}

impl From<UniverseError> for TrendrankError {
    fn from(err: UniverseError) -> Self {
        TrendrankError::ConfigInvalid {
            section: "universe".to_string(),
            key: "tickers".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Parse a comma or newline separated ticker list.
///
/// Tokens are trimmed and uppercased; blanks are skipped and duplicates
/// collapse. The result is sorted.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = BTreeSet::new();

    for token in input.split([',', '\n']) {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') {
            return Err(UniverseError::InvalidTicker(trimmed.to_string()));
        }
        tickers.insert(trimmed.to_uppercase());
    }

    if tickers.is_empty() {
        return Err(UniverseError::Empty);
    }
    Ok(tickers.into_iter().collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    Downloaded,
    Missing,
}

impl Coverage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Coverage::Downloaded => "downloaded",
            Coverage::Missing => "missing",
        }
    }
}

/// Bars per loaded ticker plus a coverage line for every requested ticker.
#[derive(Debug, Clone, Default)]
pub struct UniverseLoad {
    pub bars: Vec<(String, Vec<PriceBar>)>,
    pub coverage: Vec<(String, Coverage)>,
}

impl UniverseLoad {
    pub fn loaded(&self) -> Vec<String> {
        self.bars.iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn missing_count(&self) -> usize {
        self.coverage
            .iter()
            .filter(|(_, c)| *c == Coverage::Missing)
            .count()
    }
}

/// Fetch every ticker's bars. A ticker that errors or returns no bars is
/// recorded as missing and skipped; it is fatal only if nothing loads.
pub fn load_universe(
    data_port: &dyn DataPort,
    tickers: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<UniverseLoad, TrendrankError> {
    let mut load = UniverseLoad::default();

    for ticker in tickers {
        match data_port.fetch_bars(ticker, start_date, end_date) {
            Ok(bars) if !bars.is_empty() => {
                log::debug!("{ticker}: {} bars", bars.len());
                load.coverage.push((ticker.clone(), Coverage::Downloaded));
                load.bars.push((ticker.clone(), bars));
            }
            Ok(_) => {
                log::warn!("skipping {ticker} (no data in range)");
                load.coverage.push((ticker.clone(), Coverage::Missing));
            }
            Err(e) => {
                log::warn!("skipping {ticker} ({e})");
                load.coverage.push((ticker.clone(), Coverage::Missing));
            }
        }
    }

    if load.bars.is_empty() {
        return Err(TrendrankError::NoData {
            instrument: "all".to_string(),
        });
    }

    if load.missing_count() > 0 {
        log::info!(
            "loaded {} of {} tickers",
            load.bars.len(),
            load.coverage.len()
        );
    }
    Ok(load)
}
