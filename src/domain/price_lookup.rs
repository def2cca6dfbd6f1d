//! Fill-price lookup: first available close on or after a date.
//!
//! Models "next available print on or after the signal date". Missing
//! samples are removed up front so lookups never land on a gap.

use crate::domain::price_history::PriceHistory;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PriceLookup {
    series: HashMap<String, Vec<(NaiveDate, f64)>>,
    last_date: Option<NaiveDate>,
}

impl PriceLookup {
    pub fn from_history(history: &PriceHistory) -> Self {
        let series = history
            .instruments()
            .filter_map(|instrument| {
                let cols = history.columns(instrument)?;
                let samples: Vec<(NaiveDate, f64)> = history
                    .dates()
                    .iter()
                    .zip(&cols.close)
                    .filter_map(|(date, close)| close.map(|c| (*date, c)))
                    .collect();
                Some((instrument.to_string(), samples))
            })
            .collect();

        Self {
            series,
            last_date: history.latest_date(),
        }
    }

    /// Build directly from sorted `(date, close)` samples per instrument.
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<(NaiveDate, f64)>)>,
    {
        let series: HashMap<String, Vec<(NaiveDate, f64)>> = samples
            .into_iter()
            .map(|(instrument, mut s)| {
                s.sort_by_key(|(date, _)| *date);
                (instrument.to_uppercase(), s)
            })
            .collect();
        let last_date = series.values().filter_map(|s| s.last().map(|(d, _)| *d)).max();
        Self { series, last_date }
    }

    pub fn price_on_or_after(&self, instrument: &str, date: NaiveDate) -> Option<Fill> {
        let samples = self.series.get(instrument)?;
        let i = samples.partition_point(|(d, _)| *d < date);
        samples.get(i).map(|&(date, price)| Fill { date, price })
    }

    /// Latest sample date across every instrument.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::PriceBar;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn lookup() -> PriceLookup {
        PriceLookup::from_samples(vec![
            (
                "AAPL".to_string(),
                vec![(d(2024, 1, 2), 100.0), (d(2024, 1, 4), 102.0), (d(2024, 1, 8), 105.0)],
            ),
            ("EMPTY".to_string(), vec![]),
        ])
    }

    #[test]
    fn exact_date_hit() {
        let fill = lookup().price_on_or_after("AAPL", d(2024, 1, 4)).unwrap();
        assert_eq!(fill, Fill { date: d(2024, 1, 4), price: 102.0 });
    }

    #[test]
    fn forward_fills_to_next_sample() {
        let fill = lookup().price_on_or_after("AAPL", d(2024, 1, 5)).unwrap();
        assert_eq!(fill.date, d(2024, 1, 8));
        assert_eq!(fill.price, 105.0);
    }

    #[test]
    fn before_first_sample_returns_first() {
        let fill = lookup().price_on_or_after("AAPL", d(2023, 6, 1)).unwrap();
        assert_eq!(fill.date, d(2024, 1, 2));
    }

    #[test]
    fn not_found_cases() {
        let lookup = lookup();
        assert!(lookup.price_on_or_after("AAPL", d(2024, 1, 9)).is_none());
        assert!(lookup.price_on_or_after("EMPTY", d(2024, 1, 1)).is_none());
        assert!(lookup.price_on_or_after("MSFT", d(2024, 1, 1)).is_none());
    }

    #[test]
    fn last_date_spans_all_series() {
        let lookup = PriceLookup::from_samples(vec![
            ("A".to_string(), vec![(d(2024, 1, 2), 1.0)]),
            ("B".to_string(), vec![(d(2024, 3, 1), 1.0)]),
        ]);
        assert_eq!(lookup.last_date(), Some(d(2024, 3, 1)));
    }

    #[test]
    fn from_history_skips_gaps() {
        let bar = |date: NaiveDate, close: f64| PriceBar {
            instrument: "AAPL".into(),
            date,
            high: None,
            low: None,
            close,
        };
        let history = PriceHistory::from_bars(vec![
            ("AAPL".to_string(), vec![bar(d(2024, 1, 2), 10.0), bar(d(2024, 1, 5), 11.0)]),
            (
                "MSFT".to_string(),
                vec![PriceBar {
                    instrument: "MSFT".into(),
                    date: d(2024, 1, 3),
                    high: None,
                    low: None,
                    close: 50.0,
                }],
            ),
        ]);
        let lookup = PriceLookup::from_history(&history);

        // 2024-01-03 is a panel row where AAPL has no sample.
        let fill = lookup.price_on_or_after("AAPL", d(2024, 1, 3)).unwrap();
        assert_eq!(fill.date, d(2024, 1, 5));
        assert_eq!(lookup.last_date(), Some(d(2024, 1, 5)));
    }
}
