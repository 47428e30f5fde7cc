//! Custom error types for citefetch.
//!
//! All library functions return `Result<T, CiteError>` instead of using
//! `unwrap()`. Per-field scrape failures are not errors at all: they degrade
//! to sentinel values inside the scraper.

use thiserror::Error;

/// Main error type for citefetch operations.
#[derive(Debug, Error)]
pub enum CiteError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTML parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by external API
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// External API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status or API error code
        code: i32,
        /// Error message from API
        message: String,
    },

    /// Bot detection could not be cleared
    #[error("Bot detection not cleared for {0}")]
    BotDetection(String),

    /// No "cites=" anchor found on the search results page
    #[error("No citation link found for the given title (searched {url})")]
    PaperIdNotFound {
        /// Search URL that was scanned, kept for manual inspection
        url: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using `CiteError`
pub type Result<T> = std::result::Result<T, CiteError>;
