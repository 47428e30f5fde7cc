//! Scraper configuration.
//!
//! All knobs that used to be module-level defaults live in one record that is
//! passed into the scraper entry point.

use chrono::Datelike;

/// Default number of citing works to fetch.
pub const DEFAULT_NRESULTS: usize = 100;

/// Default sort column.
pub const DEFAULT_SORT_COLUMN: &str = "Citations";

/// Configuration for a citation-scraping run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Number of citing works to fetch (paginated in pages of 10)
    pub n_results: usize,
    /// Column to sort the final table by
    pub sort_by: String,
    /// Lower bound on publication year, if any
    pub start_year: Option<i32>,
    /// Upper bound on publication year; also the reference year for cit/year
    pub end_year: i32,
    /// Custom base URL for mirror sites
    pub base_url: Option<String>,
    /// Proxy URL (e.g., "http://127.0.0.1:7890")
    pub proxy: Option<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            n_results: DEFAULT_NRESULTS,
            sort_by: DEFAULT_SORT_COLUMN.to_string(),
            start_year: None,
            end_year: current_year(),
            base_url: None,
            proxy: None,
        }
    }
}

/// The current calendar year, used as the default upper bound.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}
