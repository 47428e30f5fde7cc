//! Persisted Scholar session cookies.
//!
//! Reusing a browser session's cookies noticeably lowers the rate of bot
//! checks, so the scraper attaches any stored cookies to every request. The
//! store is a flat name → value JSON map at `~/.citefetch_cookies.json`;
//! users export it from a browser session where Scholar already trusts them.

use crate::error::{CiteError, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

fn default_store_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".citefetch_cookies.json"))
        .ok_or_else(|| CiteError::Config("Cannot determine home directory".to_string()))
}

/// Loads and saves the cookie map.
pub struct CookieStore {
    path: PathBuf,
}

impl CookieStore {
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: default_store_path()?,
        })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the cookie map; an absent or unreadable file yields an empty map.
    pub fn load(&self) -> BTreeMap<String, String> {
        if !self.path.exists() {
            debug!("Cookie file not found: {:?}", self.path);
            return BTreeMap::new();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Failed to parse cookie file: {}", e);
                    BTreeMap::new()
                }
            },
            Err(e) => {
                warn!("Failed to read cookie file: {}", e);
                BTreeMap::new()
            }
        }
    }

    /// Render the stored cookies as a `Cookie:` header value, or `None` when
    /// the store is empty.
    pub fn header_value(&self) -> Option<String> {
        let cookies = self.load();
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn save(&self, cookies: &BTreeMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(cookies)?;
        std::fs::write(&self.path, content)?;
        debug!("Saved {} cookies to {:?}", cookies.len(), self.path);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for CookieStore {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            path: PathBuf::from(".citefetch_cookies.json"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_missing_file_is_empty() {
        let store = CookieStore::with_path(PathBuf::from("/nonexistent/cookies.json"));
        assert!(store.load().is_empty());
        assert!(store.header_value().is_none());
    }

    #[test]
    fn test_save_load_and_header() -> Result<()> {
        let temp = NamedTempFile::new()?;
        let store = CookieStore::with_path(temp.path().to_path_buf());

        let mut cookies = BTreeMap::new();
        cookies.insert("NID".to_string(), "abc123".to_string());
        cookies.insert("GSP".to_string(), "LM=1".to_string());
        store.save(&cookies)?;

        assert_eq!(store.load().len(), 2);
        // BTreeMap iteration order makes the header deterministic.
        assert_eq!(store.header_value().as_deref(), Some("GSP=LM=1; NID=abc123"));
        Ok(())
    }

    #[test]
    fn test_garbage_file_is_empty() -> Result<()> {
        let temp = NamedTempFile::new()?;
        std::fs::write(temp.path(), "not json")?;
        let store = CookieStore::with_path(temp.path().to_path_buf());
        assert!(store.load().is_empty());
        Ok(())
    }
}
