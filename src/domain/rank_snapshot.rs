//! Ranked universe for one evaluation date.
//!
//! A snapshot always holds a dense permutation of ranks 1..K. It is built
//! either from scored instruments ([`RankSnapshot::from_scores`]) or from
//! previously written rank rows ([`group_rank_rows`]).

use crate::domain::error::TrendrankError;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    pub instrument: String,
    pub rank: usize,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankSnapshot {
    date: NaiveDate,
    entries: Vec<RankEntry>,
    index: HashMap<String, usize>,
}

impl RankSnapshot {
    /// Rank scored instruments: score descending, instrument ascending on ties.
    pub fn from_scores(date: NaiveDate, scores: Vec<(String, f64)>) -> Self {
        let mut scores = scores;
        scores.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let entries = scores
            .into_iter()
            .enumerate()
            .map(|(i, (instrument, score))| RankEntry {
                instrument,
                rank: i + 1,
                score,
            })
            .collect();
        Self::from_entries(date, entries)
    }

    /// Re-densify rows that already carry a rank. Rows are ordered by their
    /// given rank (instrument ascending on equal rank) and renumbered 1..K;
    /// a duplicated instrument keeps its best-ranked row.
    pub fn from_ranked_rows(date: NaiveDate, rows: Vec<RankRow>) -> Self {
        let mut rows = rows;
        rows.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.instrument.cmp(&b.instrument)));

        let mut seen = HashSet::new();
        let entries = rows
            .into_iter()
            .filter(|row| seen.insert(row.instrument.clone()))
            .enumerate()
            .map(|(i, row)| RankEntry {
                instrument: row.instrument,
                rank: i + 1,
                score: row.score,
            })
            .collect();
        Self::from_entries(date, entries)
    }

    fn from_entries(date: NaiveDate, entries: Vec<RankEntry>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.instrument.clone(), i))
            .collect();
        Self {
            date,
            entries,
            index,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    pub fn rank_of(&self, instrument: &str) -> Option<usize> {
        self.index.get(instrument).map(|&i| self.entries[i].rank)
    }

    pub fn score_of(&self, instrument: &str) -> Option<f64> {
        self.index.get(instrument).map(|&i| self.entries[i].score)
    }

    /// Instruments in ascending rank order.
    pub fn ordered(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.instrument.as_str())
    }

    /// Keep only the best `k` ranks.
    pub fn top(&self, k: usize) -> Self {
        Self::from_entries(self.date, self.entries.iter().take(k).cloned().collect())
    }
}

/// One row of tabular rank input.
#[derive(Debug, Clone, PartialEq)]
pub struct RankRow {
    pub date: NaiveDate,
    pub rank: usize,
    pub instrument: String,
    pub score: f64,
}

/// Group rank rows by date into snapshots, ascending by date.
pub fn group_rank_rows(rows: Vec<RankRow>) -> Result<Vec<RankSnapshot>, TrendrankError> {
    let mut by_date: BTreeMap<NaiveDate, Vec<RankRow>> = BTreeMap::new();
    for row in rows {
        by_date.entry(row.date).or_default().push(row);
    }

    let snapshots: Vec<RankSnapshot> = by_date
        .into_iter()
        .map(|(date, rows)| RankSnapshot::from_ranked_rows(date, rows))
        .collect();

    if snapshots.is_empty() {
        return Err(TrendrankError::NoSnapshots);
    }
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(date: NaiveDate, rank: usize, instrument: &str, score: f64) -> RankRow {
        RankRow {
            date,
            rank,
            instrument: instrument.to_string(),
            score,
        }
    }

    #[test]
    fn from_scores_sorts_descending() {
        let snap = RankSnapshot::from_scores(
            d(2024, 1, 5),
            vec![("A".into(), 0.2), ("B".into(), 0.9), ("C".into(), 0.5)],
        );
        assert_eq!(snap.ordered().collect::<Vec<_>>(), vec!["B", "C", "A"]);
        assert_eq!(snap.rank_of("B"), Some(1));
        assert_eq!(snap.rank_of("A"), Some(3));
        assert_eq!(snap.score_of("C"), Some(0.5));
        assert_eq!(snap.rank_of("Z"), None);
    }

    #[test]
    fn ties_break_by_instrument() {
        let snap = RankSnapshot::from_scores(
            d(2024, 1, 5),
            vec![("MSFT".into(), 0.5), ("AAPL".into(), 0.5), ("NVDA".into(), 0.7)],
        );
        assert_eq!(snap.ordered().collect::<Vec<_>>(), vec!["NVDA", "AAPL", "MSFT"]);
    }

    #[test]
    fn top_truncates() {
        let snap = RankSnapshot::from_scores(
            d(2024, 1, 5),
            vec![("A".into(), 3.0), ("B".into(), 2.0), ("C".into(), 1.0)],
        );
        let top = snap.top(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top.rank_of("C"), None);
        assert_eq!(top.rank_of("B"), Some(2));
    }

    #[test]
    fn grouped_rows_are_dense_and_dated() {
        let rows = vec![
            row(d(2024, 1, 12), 5, "C", 0.4),
            row(d(2024, 1, 5), 2, "B", 0.8),
            row(d(2024, 1, 12), 1, "A", 0.9),
            row(d(2024, 1, 5), 1, "A", 0.9),
        ];
        let snaps = group_rank_rows(rows).unwrap();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].date(), d(2024, 1, 5));
        assert_eq!(snaps[1].date(), d(2024, 1, 12));
        // rank 5 is renumbered to 2 within its date
        assert_eq!(snaps[1].rank_of("C"), Some(2));
    }

    #[test]
    fn duplicated_instrument_keeps_best_rank() {
        let date = d(2024, 1, 5);
        let snap = RankSnapshot::from_ranked_rows(
            date,
            vec![row(date, 3, "A", 0.1), row(date, 1, "A", 0.9), row(date, 2, "B", 0.5)],
        );
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.rank_of("A"), Some(1));
        assert_eq!(snap.score_of("A"), Some(0.9));
    }

    #[test]
    fn empty_rows_are_fatal() {
        assert!(matches!(group_rank_rows(vec![]), Err(TrendrankError::NoSnapshots)));
    }
}
