//! The in-memory citation table.
//!
//! One `CitationRecord` per citing work, accumulated in fetch order. Ranks
//! are assigned as records arrive and never renumbered: sorting produces a
//! new view of the same records, so the CSV on disk and any sorted printout
//! agree on which row was fetched when.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Column headers of the output table, in CSV order.
pub const COLUMNS: [&str; 9] = [
    "Rank",
    "Author",
    "Title",
    "Citations",
    "Year",
    "Publisher",
    "Venue",
    "Source",
    "cit/year",
];

/// One row of the citation table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationRecord {
    /// 1-based position in the fetched result stream
    #[serde(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Citations")]
    pub citations: u32,
    /// Publication year; 0 when unparseable
    #[serde(rename = "Year")]
    pub year: u32,
    #[serde(rename = "Publisher")]
    pub publisher: String,
    #[serde(rename = "Venue")]
    pub venue: String,
    #[serde(rename = "Source")]
    pub source: String,
    /// Derived column, filled by [`ResultSet::rank_and_derive`]
    #[serde(rename = "cit/year")]
    pub citations_per_year: u32,
}

/// Ordered collection of citation records, ranked by fetch order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: Vec<CitationRecord>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, assigning the next rank in fetch order.
    pub fn push(&mut self, mut record: CitationRecord) {
        record.rank = self.records.len() + 1;
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CitationRecord] {
        &self.records
    }

    /// Fill in the cit/year column and return a view sorted descending by
    /// `sort_by`.
    ///
    /// cit/year is `round(citations / max(1, end_year + 1 - min(year,
    /// end_year)))`. Rows whose year failed to parse carry year 0, which
    /// inflates the denominator to `end_year + 1` and drives the metric
    /// toward zero; that skew is kept as-is rather than corrected.
    ///
    /// Unknown column names fall back to sorting by `Citations` with a
    /// logged diagnostic. Ranks in the returned view keep their fetch-order
    /// values.
    pub fn rank_and_derive(&mut self, end_year: i32, sort_by: &str) -> Vec<CitationRecord> {
        for record in &mut self.records {
            record.citations_per_year = citations_per_year(record.citations, record.year, end_year);
        }

        let column = if COLUMNS.contains(&sort_by) {
            sort_by
        } else {
            warn!(
                column = sort_by,
                "Column name to be sorted not found. Sorting by the number of citations..."
            );
            "Citations"
        };

        let mut view = self.records.clone();
        view.sort_by(|a, b| compare_by_column(a, b, column).reverse());
        view
    }

    /// Write the table to `path` in fetch order, UTF-8, with headers.
    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().has_headers(true).from_path(path)?;
        for record in &self.records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Compute the derived citations-per-year value for one row.
pub fn citations_per_year(citations: u32, year: u32, end_year: i32) -> u32 {
    let clamped = (year as i64).min(end_year as i64);
    let denominator = (end_year as i64 + 1 - clamped).max(1);
    (citations as f64 / denominator as f64).round() as u32
}

fn compare_by_column(a: &CitationRecord, b: &CitationRecord, column: &str) -> Ordering {
    match column {
        "Rank" => a.rank.cmp(&b.rank),
        "Author" => a.author.cmp(&b.author),
        "Title" => a.title.cmp(&b.title),
        "Year" => a.year.cmp(&b.year),
        "Publisher" => a.publisher.cmp(&b.publisher),
        "Venue" => a.venue.cmp(&b.venue),
        "Source" => a.source.cmp(&b.source),
        "cit/year" => a.citations_per_year.cmp(&b.citations_per_year),
        _ => a.citations.cmp(&b.citations),
    }
}

/// Output file path for a given paper title: spaces and colons become
/// underscores, suffixed with `_citations.csv`.
pub fn csv_output_path(dir: &Path, title: &str) -> PathBuf {
    let stem = title.replace([' ', ':'], "_");
    dir.join(format!("{}_citations.csv", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, citations: u32, year: u32) -> CitationRecord {
        CitationRecord {
            rank: 0,
            author: "A Author".to_string(),
            title: title.to_string(),
            citations,
            year,
            publisher: " pub.com".to_string(),
            venue: "Venue".to_string(),
            source: format!("https://example.com/{}", title),
            citations_per_year: 0,
        }
    }

    fn sample_set() -> ResultSet {
        let mut set = ResultSet::new();
        set.push(record("first", 10, 2020));
        set.push(record("second", 500, 2015));
        set.push(record("third", 40, 0));
        set
    }

    #[test]
    fn test_ranks_increase_in_fetch_order() {
        let set = sample_set();
        let ranks: Vec<usize> = set.records().iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_ranks_invariant_under_resort() {
        let mut set = sample_set();
        let view = set.rank_and_derive(2024, "Citations");
        // Sorted order differs, but every record keeps its fetch-order rank.
        assert_eq!(view[0].title, "second");
        assert_eq!(view[0].rank, 2);
        let mut ranks: Vec<usize> = view.iter().map(|r| r.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![1, 2, 3]);
        // The underlying set is still in fetch order.
        assert_eq!(set.records()[0].title, "first");
    }

    #[test]
    fn test_citations_per_year_formula() {
        // 10 citations over 2020..=2024 -> 10 / 5 = 2
        assert_eq!(citations_per_year(10, 2020, 2024), 2);
        // 500 over 2015..=2024 -> 500 / 10 = 50
        assert_eq!(citations_per_year(500, 2015, 2024), 50);
        // round() applies: 100 / 6 = 16.67 -> 17
        assert_eq!(citations_per_year(100, 2019, 2024), 17);
    }

    #[test]
    fn test_citations_per_year_unparsed_year_skew() {
        // Year 0 inflates the denominator to end_year + 1.
        assert_eq!(citations_per_year(40, 0, 2024), 0);
        assert_eq!(citations_per_year(40500, 0, 2024), 20);
    }

    #[test]
    fn test_citations_per_year_future_year_clamped() {
        // A future-dated paper clamps to a denominator of 1.
        assert_eq!(citations_per_year(7, 2030, 2024), 7);
    }

    #[test]
    fn test_derive_fills_column() {
        let mut set = sample_set();
        set.rank_and_derive(2024, "Citations");
        assert_eq!(set.records()[0].citations_per_year, 2);
        assert_eq!(set.records()[1].citations_per_year, 50);
        assert_eq!(set.records()[2].citations_per_year, 0);
    }

    #[test]
    fn test_sort_by_year() {
        let mut set = sample_set();
        let view = set.rank_and_derive(2024, "Year");
        let years: Vec<u32> = view.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2020, 2015, 0]);
    }

    #[test]
    fn test_unknown_column_falls_back_to_citations() {
        let mut set = sample_set();
        let view = set.rank_and_derive(2024, "NoSuchColumn");
        let citations: Vec<u32> = view.iter().map(|r| r.citations).collect();
        assert_eq!(citations, vec![500, 40, 10]);
    }

    #[test]
    fn test_csv_output_path() {
        let path = csv_output_path(Path::new("/tmp"), "Attention: Is All You Need");
        assert_eq!(
            path,
            PathBuf::from("/tmp/Attention__Is_All_You_Need_citations.csv")
        );
    }

    #[test]
    fn test_save_csv_roundtrip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut set = sample_set();
        set.rank_and_derive(2024, "Citations");
        let path = dir.path().join("out.csv");
        set.save_csv(&path)?;

        let content = std::fs::read_to_string(&path)?;
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("Rank,Author,Title,Citations,Year,Publisher,Venue,Source,cit/year")
        );
        assert_eq!(lines.count(), 3);
        Ok(())
    }
}
