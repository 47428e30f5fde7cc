//! Semantic Scholar Graph API client.
//!
//! Used by the `update` and `search` subcommands for structured metadata:
//! title lookup (with normalized-title verification, since the first search
//! hit is not always the paper asked for), keyword search, and
//! recommendations.
//!
//! API details:
//! - Search endpoint: GET /graph/v1/paper/search
//! - Recommendations: GET /recommendations/v1/papers/forpaper/{id}
//! - Rate limit: 1 req/s unauthenticated, higher with an API key

use crate::error::{CiteError, Result};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Semantic Scholar Graph API base URL
const GRAPH_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";

/// Recommendations API base URL
const RECOMMENDATIONS_API_BASE: &str = "https://api.semanticscholar.org/recommendations/v1";

/// Fields requested for every paper payload
const PAPER_FIELDS: &str =
    "title,year,authors,venue,publicationVenue,url,citationStyles,externalIds,citationCount";

/// Structured metadata for one paper.
#[derive(Debug, Clone, Default)]
pub struct PaperInfo {
    pub title: String,
    pub authors: Vec<String>,
    pub venue: String,
    pub year: Option<i32>,
    pub citation_count: Option<u64>,
    pub url: String,
    pub bibtex: String,
    pub doi: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Option<Vec<ApiPaper>>,
}

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    #[serde(rename = "recommendedPapers")]
    recommended_papers: Option<Vec<ApiPaper>>,
}

#[derive(Debug, Deserialize)]
struct ApiPaper {
    title: Option<String>,
    year: Option<i32>,
    authors: Option<Vec<ApiAuthor>>,
    venue: Option<String>,
    #[serde(rename = "publicationVenue")]
    publication_venue: Option<ApiVenue>,
    url: Option<String>,
    #[serde(rename = "citationStyles")]
    citation_styles: Option<ApiCitationStyles>,
    #[serde(rename = "externalIds")]
    external_ids: Option<ApiExternalIds>,
    #[serde(rename = "citationCount")]
    citation_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiVenue {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCitationStyles {
    bibtex: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}

impl From<ApiPaper> for PaperInfo {
    fn from(paper: ApiPaper) -> Self {
        // publicationVenue carries the canonical name; the flat venue string
        // is the fallback.
        let venue = paper
            .publication_venue
            .and_then(|v| v.name)
            .or(paper.venue)
            .unwrap_or_default();

        PaperInfo {
            title: paper.title.unwrap_or_default(),
            authors: paper
                .authors
                .unwrap_or_default()
                .into_iter()
                .filter_map(|a| a.name)
                .collect(),
            venue,
            year: paper.year,
            citation_count: paper.citation_count,
            url: paper.url.unwrap_or_default(),
            bibtex: paper.citation_styles.and_then(|c| c.bibtex).unwrap_or_default(),
            doi: paper.external_ids.and_then(|ids| ids.doi).unwrap_or_default(),
        }
    }
}

/// Semantic Scholar API client.
pub struct SemanticClient {
    client: Client,
    api_key: Option<String>,
}

impl SemanticClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CiteError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, api_key })
    }

    /// Keyword search, returning up to `limit` papers.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<PaperInfo>> {
        let mut url = url::Url::parse(&format!("{}/paper/search", GRAPH_API_BASE))
            .map_err(|e| CiteError::Config(format!("Invalid API URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("limit", &limit.to_string())
            .append_pair("fields", PAPER_FIELDS);

        debug!(url = %url, "Semantic Scholar search");
        let response: SearchResponse = self.get_json(url.as_str()).await?;
        Ok(response
            .data
            .unwrap_or_default()
            .into_iter()
            .map(PaperInfo::from)
            .collect())
    }

    /// Look up a single paper by title.
    ///
    /// Searches with `limit=1` and verifies the hit against the requested
    /// title under normalization; a mismatched first hit yields `Ok(None)`
    /// rather than wrong metadata.
    pub async fn lookup_by_title(&self, title: &str) -> Result<Option<PaperInfo>> {
        let results = self.search(title, 1).await?;
        let Some(paper) = results.into_iter().next() else {
            return Ok(None);
        };
        if normalize_title(&paper.title) != normalize_title(title) {
            warn!(requested = title, got = %paper.title, "title mismatch");
            return Ok(None);
        }
        Ok(Some(paper))
    }

    /// Recommended papers for a given Semantic Scholar paper id.
    pub async fn recommendations(&self, paper_id: &str, limit: usize) -> Result<Vec<PaperInfo>> {
        let mut url = url::Url::parse(&format!(
            "{}/papers/forpaper/{}",
            RECOMMENDATIONS_API_BASE, paper_id
        ))
        .map_err(|e| CiteError::Config(format!("Invalid API URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("fields", PAPER_FIELDS);

        debug!(url = %url, "Semantic Scholar recommendations");
        let response: RecommendationsResponse = self.get_json(url.as_str()).await?;
        Ok(response
            .recommended_papers
            .unwrap_or_default()
            .into_iter()
            .map(PaperInfo::from)
            .collect())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CiteError::RateLimited(1));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CiteError::Api {
                code: status.as_u16() as i32,
                message: format!("Semantic Scholar API error: {} - {}", status, error_text),
            });
        }

        response
            .json()
            .await
            .map_err(|e| CiteError::Parse(format!("Failed to parse API response: {}", e)))
    }
}

/// Lowercase, strip everything but letters, digits and whitespace, collapse
/// runs of whitespace. Two titles that agree under this normalization are
/// treated as the same paper.
pub fn normalize_title(title: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();

    let non_alnum =
        NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9\s]").expect("valid literal regex"));
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid literal regex"));

    let lower = title.to_lowercase();
    let stripped = non_alnum.replace_all(&lower, "");
    whitespace.replace_all(&stripped, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(
            normalize_title("Attention Is All You Need!"),
            "attention is all you need"
        );
        assert_eq!(
            normalize_title("  BERT:   Pre-training of Deep\tBidirectional Transformers "),
            "bert pretraining of deep bidirectional transformers"
        );
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn test_normalized_titles_agree_across_punctuation() {
        assert_eq!(
            normalize_title("GPT-3: Language Models are Few-Shot Learners"),
            normalize_title("gpt3 language models are few shot learners")
        );
    }

    #[test]
    fn test_paper_info_from_api_payload() -> Result<()> {
        let json = r#"{
            "title": "A Paper",
            "year": 2021,
            "authors": [{"name": "J Smith"}, {"name": "A Doe"}],
            "venue": "arXiv",
            "publicationVenue": {"name": "Nature"},
            "url": "https://www.semanticscholar.org/paper/abc",
            "citationStyles": {"bibtex": "@article{smith2021}"},
            "externalIds": {"DOI": "10.1000/xyz"},
            "citationCount": 12
        }"#;
        let api: ApiPaper = serde_json::from_str(json)?;
        let info = PaperInfo::from(api);
        assert_eq!(info.title, "A Paper");
        assert_eq!(info.authors, vec!["J Smith", "A Doe"]);
        // publicationVenue wins over the flat venue string.
        assert_eq!(info.venue, "Nature");
        assert_eq!(info.year, Some(2021));
        assert_eq!(info.citation_count, Some(12));
        assert_eq!(info.doi, "10.1000/xyz");
        assert_eq!(info.bibtex, "@article{smith2021}");
        Ok(())
    }

    #[test]
    fn test_paper_info_missing_fields_default() -> Result<()> {
        let api: ApiPaper = serde_json::from_str("{}")?;
        let info = PaperInfo::from(api);
        assert!(info.title.is_empty());
        assert!(info.authors.is_empty());
        assert_eq!(info.year, None);
        assert_eq!(info.citation_count, None);
        Ok(())
    }

    #[test]
    fn test_search_response_shape() -> Result<()> {
        let json = r#"{"total": 1, "data": [{"title": "A Paper"}]}"#;
        let response: SearchResponse = serde_json::from_str(json)?;
        assert_eq!(response.data.map(|d| d.len()), Some(1));
        Ok(())
    }

    #[test]
    fn test_recommendations_response_shape() -> Result<()> {
        let json = r#"{"recommendedPapers": [{"title": "A"}, {"title": "B"}]}"#;
        let response: RecommendationsResponse = serde_json::from_str(json)?;
        assert_eq!(response.recommended_papers.map(|d| d.len()), Some(2));
        Ok(())
    }
}
