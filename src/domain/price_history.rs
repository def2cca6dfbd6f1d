//! Date-aligned price panel shared by the score engine and the price lookup.
//!
//! Every instrument is stored against one unified, strictly increasing date
//! index. A date on which an instrument has no sample holds `None`.

use crate::domain::ohlcv::PriceBar;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Close/high/low columns for one instrument, aligned to the panel's dates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceColumns {
    pub close: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
}

impl PriceColumns {
    fn with_len(len: usize) -> Self {
        Self {
            close: vec![None; len],
            high: vec![None; len],
            low: vec![None; len],
        }
    }

    fn has_any_close(&self) -> bool {
        self.close.iter().any(Option::is_some)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceHistory {
    dates: Vec<NaiveDate>,
    series: BTreeMap<String, PriceColumns>,
}

impl PriceHistory {
    /// Build the panel from per-instrument bars. Instruments without a single
    /// close are dropped.
    pub fn from_bars<I>(bars_by_instrument: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<PriceBar>)>,
    {
        let bars_by_instrument: Vec<(String, Vec<PriceBar>)> =
            bars_by_instrument.into_iter().collect();

        let dates = build_unified_timeline(bars_by_instrument.iter().map(|(_, bars)| bars.as_slice()));
        let index: BTreeMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let mut series = BTreeMap::new();
        for (instrument, bars) in bars_by_instrument {
            let mut columns = PriceColumns::with_len(dates.len());
            for bar in &bars {
                let i = index[&bar.date];
                columns.close[i] = Some(bar.close);
                columns.high[i] = bar.high;
                columns.low[i] = bar.low;
            }
            if columns.has_any_close() {
                series.insert(instrument.to_uppercase(), columns);
            } else {
                log::debug!("dropping {instrument}: no closing prices");
            }
        }

        Self { dates, series }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn contains(&self, instrument: &str) -> bool {
        self.series.contains_key(instrument)
    }

    pub fn columns(&self, instrument: &str) -> Option<&PriceColumns> {
        self.series.get(instrument)
    }

    /// Number of panel rows dated on or before `date`.
    pub fn rows_through(&self, date: NaiveDate) -> usize {
        self.dates.partition_point(|d| *d <= date)
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Resample to one row per ISO week, dated at the week's last trading day.
    ///
    /// close = last present close, high = max present high, low = min present
    /// low. An instrument without a close in a week is missing for that row.
    pub fn resample_weekly(&self) -> Self {
        let mut week_bounds: Vec<(usize, usize)> = Vec::new();
        for (i, date) in self.dates.iter().enumerate() {
            match week_bounds.last_mut() {
                Some((start, end)) if same_iso_week(self.dates[*start], *date) => *end = i,
                _ => week_bounds.push((i, i)),
            }
        }

        let dates: Vec<NaiveDate> = week_bounds.iter().map(|&(_, end)| self.dates[end]).collect();

        let series = self
            .series
            .iter()
            .map(|(instrument, cols)| {
                let mut weekly = PriceColumns::with_len(dates.len());
                for (w, &(start, end)) in week_bounds.iter().enumerate() {
                    let range = start..=end;
                    weekly.close[w] = cols.close[range.clone()].iter().rev().find_map(|c| *c);
                    if weekly.close[w].is_none() {
                        continue;
                    }
                    weekly.high[w] = cols.high[range.clone()].iter().flatten().copied().reduce(f64::max);
                    weekly.low[w] = cols.low[range].iter().flatten().copied().reduce(f64::min);
                }
                (instrument.clone(), weekly)
            })
            .collect();

        Self { dates, series }
    }
}

fn same_iso_week(a: NaiveDate, b: NaiveDate) -> bool {
    a.iso_week() == b.iso_week()
}

/// Sorted union of all dates present in the given bar sets.
pub fn build_unified_timeline<'a, I>(bar_sets: I) -> Vec<NaiveDate>
where
    I: IntoIterator<Item = &'a [PriceBar]>,
{
    let unique_dates: BTreeSet<NaiveDate> = bar_sets
        .into_iter()
        .flat_map(|bars| bars.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}
