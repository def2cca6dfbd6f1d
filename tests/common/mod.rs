#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use trendrank::domain::backtest::BacktestConfig;
use trendrank::domain::error::TrendrankError;
pub use trendrank::domain::ohlcv::PriceBar;
use trendrank::domain::price_lookup::PriceLookup;
use trendrank::domain::rank_snapshot::RankSnapshot;
use trendrank::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, instrument: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(instrument.to_string(), bars);
        self
    }

    pub fn with_error(mut self, instrument: &str, reason: &str) -> Self {
        self.errors.insert(instrument.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        instrument: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, TrendrankError> {
        if let Some(reason) = self.errors.get(instrument) {
            return Err(TrendrankError::Data {
                source_name: instrument.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(instrument)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_instruments(&self) -> Result<Vec<String>, TrendrankError> {
        let mut all: Vec<String> = self.data.keys().cloned().collect();
        all.sort();
        Ok(all)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(instrument: &str, date: &str, close: f64) -> PriceBar {
    PriceBar {
        instrument: instrument.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        high: Some(close * 1.01),
        low: Some(close * 0.99),
        close,
    }
}

/// `count` weekday bars from `start`, compounding at `daily_growth` with a
/// small alternating wiggle so the true range never collapses.
pub fn generate_bars(
    instrument: &str,
    start: NaiveDate,
    count: usize,
    start_price: f64,
    daily_growth: f64,
) -> Vec<PriceBar> {
    weekdays(start, count)
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            let wiggle = if i % 2 == 0 { 1.002 } else { 0.998 };
            let close = start_price * (1.0 + daily_growth).powi(i as i32) * wiggle;
            PriceBar {
                instrument: instrument.to_string(),
                date: d,
                high: Some(close * 1.01),
                low: Some(close * 0.99),
                close,
            }
        })
        .collect()
}

pub fn weekdays(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    start
        .iter_days()
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

pub fn write_price_csv(dir: &Path, bars: &[PriceBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for bar in bars {
        content.push_str(&format!(
            "{},{},{},{},{},1000\n",
            bar.date,
            bar.close,
            bar.high.map(|v| v.to_string()).unwrap_or_default(),
            bar.low.map(|v| v.to_string()).unwrap_or_default(),
            bar.close
        ));
    }
    let name = &bars[0].instrument;
    fs::write(dir.join(format!("{name}.csv")), content).unwrap();
}

/// Snapshot ranking `order` 1..K with descending scores.
pub fn snapshot(date: NaiveDate, order: &[&str]) -> RankSnapshot {
    let n = order.len() as f64;
    RankSnapshot::from_scores(
        date,
        order
            .iter()
            .enumerate()
            .map(|(i, s)| (s.to_string(), n - i as f64))
            .collect(),
    )
}

/// Every instrument priced at `price` on every date.
pub fn flat_lookup(instruments: &[&str], dates: &[NaiveDate], price: f64) -> PriceLookup {
    PriceLookup::from_samples(instruments.iter().map(|s| {
        (
            s.to_string(),
            dates.iter().map(|&d| (d, price)).collect::<Vec<_>>(),
        )
    }))
}

pub fn rotation_config(top_n: usize, hold_max_rank: usize) -> BacktestConfig {
    BacktestConfig {
        top_n,
        hold_max_rank,
        starting_equity: 1.0,
    }
}
