//! # citefetch
//!
//! Citation list scraper and bibliographic metadata updater.
//!
//! ## Modules
//!
//! - [`scholar`] - Google Scholar citation scraping
//! - [`extract`] - per-field extractors for Scholar result blocks
//! - [`table`] - the in-memory citation table and CSV output
//! - [`captcha`] - injectable bot-detection escalation
//! - [`semantic`] - Semantic Scholar Graph API client
//! - [`update`] - batch citation-count updates of CSV tables
//! - [`cookies`] - persisted Scholar session cookies
//! - [`error`] - custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use citefetch::{captcha::PromptResolver, config::ScrapeConfig, scholar};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScrapeConfig::default();
//!     let resolver = PromptResolver::new(scholar::build_http_client(None)?);
//!     let id = scholar::resolve_paper_id("Attention is all you need", &config, &resolver).await?;
//!     let set = scholar::fetch_citations(&id, &config, &resolver).await?;
//!     println!("Fetched {} citing works", set.len());
//!     Ok(())
//! }
//! ```

pub mod captcha;
pub mod config;
pub mod cookies;
pub mod error;
pub mod extract;
pub mod scholar;
pub mod semantic;
pub mod table;
pub mod update;

pub use error::{CiteError, Result};
