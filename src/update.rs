//! Batch citation-count update of a CSV of papers.
//!
//! Reads a table with a `Title` column, looks each row up on Semantic
//! Scholar, and fills in citation counts plus the other metadata columns.
//! A row whose lookup fails (no hit, title mismatch, or API error) is left
//! untouched and the run continues.

use crate::error::{CiteError, Result};
use crate::semantic::{PaperInfo, SemanticClient};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Columns the updater maintains in the output table, added when absent.
const MANAGED_COLUMNS: [&str; 8] = [
    "Title",
    "Authors",
    "Venue",
    "Year",
    "CitationCount",
    "URL",
    "Bibtex",
    "paperId",
];

/// Outcome counters for one update run.
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Update the citation metadata of every row in `input`, writing the result
/// to `output`. Rows before `start_idx` are carried over unmodified.
///
/// Only `.csv` files are supported; other extensions are rejected.
pub async fn run_update(
    client: &SemanticClient,
    input: &Path,
    output: &Path,
    start_idx: Option<usize>,
) -> Result<UpdateReport> {
    require_csv(input)?;
    require_csv(output)?;

    let mut rdr = csv::Reader::from_path(input)?;
    let mut columns: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in rdr.records() {
        rows.push(record?.iter().map(String::from).collect());
    }

    let title_idx = columns
        .iter()
        .position(|c| c == "Title")
        .ok_or_else(|| CiteError::Config("input file has no Title column".to_string()))?;

    ensure_columns(&mut columns, &mut rows);

    let skip = start_idx.unwrap_or(0);
    let mut report = UpdateReport::default();

    for (index, row) in rows.iter_mut().enumerate() {
        if index < skip {
            report.skipped += 1;
            continue;
        }
        let title = row[title_idx].clone();

        match client.lookup_by_title(&title).await {
            Ok(Some(paper)) => {
                println!(
                    "index {}: '{}' citation count = {}",
                    index,
                    paper.title,
                    paper
                        .citation_count
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                );
                merge_row(row, &columns, &paper);
                report.updated += 1;
            }
            Ok(None) => {
                warn!(index = index, title = %title, "no matching paper found, row left unchanged");
                report.failed += 1;
            }
            Err(e) => {
                warn!(index = index, title = %title, error = %e, "lookup failed, row left unchanged");
                report.failed += 1;
            }
        }

        // Unauthenticated Graph API allows 1 request per second.
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    let mut wtr = csv::Writer::from_path(output)?;
    wtr.write_record(&columns)?;
    for row in &rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;

    Ok(report)
}

fn require_csv(path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => Ok(()),
        _ => Err(CiteError::Config(format!(
            "Unsupported file format: {} (only .csv is supported)",
            path.display()
        ))),
    }
}

/// Add any managed column missing from the header, padding existing rows.
fn ensure_columns(columns: &mut Vec<String>, rows: &mut [Vec<String>]) {
    for name in MANAGED_COLUMNS {
        if !columns.iter().any(|c| c == name) {
            columns.push(name.to_string());
        }
    }
    for row in rows.iter_mut() {
        row.resize(columns.len(), String::new());
    }
}

/// Write a paper's metadata into the managed columns of one row.
fn merge_row(row: &mut [String], columns: &[String], paper: &PaperInfo) {
    let set = |row: &mut [String], name: &str, value: String| {
        if let Some(idx) = columns.iter().position(|c| c == name) {
            row[idx] = value;
        }
    };

    set(row, "Title", paper.title.clone());
    set(row, "Authors", paper.authors.join(", "));
    set(row, "Venue", paper.venue.clone());
    set(
        row,
        "Year",
        paper.year.map(|y| y.to_string()).unwrap_or_default(),
    );
    set(
        row,
        "CitationCount",
        paper
            .citation_count
            .map(|c| c.to_string())
            .unwrap_or_default(),
    );
    set(row, "URL", paper.url.clone());
    set(row, "Bibtex", paper.bibtex.clone());
    set(row, "paperId", paper.doi.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_paper() -> PaperInfo {
        PaperInfo {
            title: "A Paper".to_string(),
            authors: vec!["J Smith".to_string(), "A Doe".to_string()],
            venue: "Nature".to_string(),
            year: Some(2021),
            citation_count: Some(12),
            url: "https://www.semanticscholar.org/paper/abc".to_string(),
            bibtex: "@article{smith2021}".to_string(),
            doi: "10.1000/xyz".to_string(),
        }
    }

    #[test]
    fn test_require_csv() {
        assert!(require_csv(&PathBuf::from("papers.csv")).is_ok());
        assert!(require_csv(&PathBuf::from("papers.xlsx")).is_err());
        assert!(require_csv(&PathBuf::from("papers")).is_err());
    }

    #[test]
    fn test_ensure_columns_adds_and_pads() {
        let mut columns = vec!["Title".to_string(), "Notes".to_string()];
        let mut rows = vec![vec!["A Paper".to_string(), "keep me".to_string()]];
        ensure_columns(&mut columns, &mut rows);

        assert_eq!(columns.len(), 9); // Title + Notes + 7 added
        assert_eq!(rows[0].len(), 9);
        assert_eq!(rows[0][1], "keep me");
        assert!(columns.iter().any(|c| c == "CitationCount"));
    }

    #[test]
    fn test_merge_row_fills_managed_columns() {
        let mut columns = vec!["Title".to_string(), "Notes".to_string()];
        let mut rows = vec![vec!["a paper".to_string(), "keep me".to_string()]];
        ensure_columns(&mut columns, &mut rows);

        merge_row(&mut rows[0], &columns, &sample_paper());

        let get = |name: &str| {
            let idx = columns.iter().position(|c| c == name).expect("column");
            rows[0][idx].clone()
        };
        assert_eq!(get("Title"), "A Paper");
        assert_eq!(get("Authors"), "J Smith, A Doe");
        assert_eq!(get("Venue"), "Nature");
        assert_eq!(get("Year"), "2021");
        assert_eq!(get("CitationCount"), "12");
        assert_eq!(get("paperId"), "10.1000/xyz");
        assert_eq!(get("Notes"), "keep me");
    }
}
