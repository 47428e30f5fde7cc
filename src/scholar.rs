//! Google Scholar citation scraping.
//!
//! Two operations: resolving the Scholar-internal citation identifier for a
//! paper title, and paginating the "cited by" listing for that identifier
//! into a [`ResultSet`]. Field extraction from the result blocks lives in
//! [`crate::extract`]; bot-detection escalation is delegated to the
//! [`CaptchaResolver`] the caller supplies.

use crate::captcha::{is_bot_check, CaptchaResolver};
use crate::config::{current_year, ScrapeConfig};
use crate::cookies::CookieStore;
use crate::error::{CiteError, Result};
use crate::extract;
use crate::table::{CitationRecord, ResultSet};
use rand::Rng;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default Google Scholar URL
pub const DEFAULT_SCHOLAR_URL: &str = "https://scholar.google.com";

/// User agent string for requests
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Results per Scholar page
const PAGE_SIZE: usize = 10;

/// Inter-page delay bounds in milliseconds
const DELAY_MS: std::ops::Range<u64> = 500..3000;

/// Resolve the opaque citation identifier for a paper title.
///
/// Runs a keyword search and scans the results page for the first anchor
/// whose href carries a `cites=` parameter (the "Cited by N" link of the
/// matching paper). Failing to find one aborts the run: without the
/// identifier no valid citing-works URL can be built.
pub async fn resolve_paper_id(
    title: &str,
    config: &ScrapeConfig,
    resolver: &dyn CaptchaResolver,
) -> Result<String> {
    let base = base_url(config);
    let client = build_http_client(config.proxy.as_deref())?;
    let cookie_header = CookieStore::default().header_value();

    let url = build_search_url(&base, title)?;
    info!(title = title, url = %url, "Resolving paper id");

    let html = fetch_html(&client, &url, cookie_header.as_deref(), resolver).await?;
    paper_id_from_search_page(&html)?.ok_or_else(|| CiteError::PaperIdNotFound {
        url: url.to_string(),
    })
}

/// Paginate the citing-works listing and accumulate one [`ResultSet`].
///
/// Pages of 10 are fetched until `config.n_results` is covered. A page that
/// fails to fetch or parse contributes zero rows and the run continues; the
/// accumulated ranks stay contiguous. A randomized delay separates pages.
pub async fn fetch_citations(
    paper_id: &str,
    config: &ScrapeConfig,
    resolver: &dyn CaptchaResolver,
) -> Result<ResultSet> {
    let base = base_url(config);
    let client = build_http_client(config.proxy.as_deref())?;
    let cookie_header = CookieStore::default().header_value();

    let mut set = ResultSet::new();

    for start in (0..config.n_results).step_by(PAGE_SIZE) {
        info!("Loading next {} results", start + PAGE_SIZE);

        let url = build_cites_url(&base, paper_id, start, config)?;
        debug!(url = %url, "Fetching page");

        match fetch_html(&client, &url, cookie_header.as_deref(), resolver).await {
            Ok(html) => {
                let before = set.len();
                parse_citation_blocks(&html, url.as_str(), &mut set)?;
                debug!(start = start, rows = set.len() - before, "Parsed page");
            }
            Err(e) => {
                warn!(start = start, error = %e, "Failed to fetch page, skipping");
            }
        }

        let delay = rand::thread_rng().gen_range(DELAY_MS);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    info!(total = set.len(), "Citation fetch complete");
    Ok(set)
}

fn base_url(config: &ScrapeConfig) -> String {
    config
        .base_url
        .as_ref()
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_SCHOLAR_URL.to_string())
}

/// Build HTTP client with optional proxy
pub fn build_http_client(proxy: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .cookie_store(true);

    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| CiteError::Config(format!("Invalid proxy URL '{}': {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| CiteError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Build the keyword-search URL used for identifier resolution.
fn build_search_url(base_url: &str, title: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/scholar", base_url))
        .map_err(|e| CiteError::Config(format!("Invalid base URL: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("q", title)
        .append_pair("hl", "en");
    Ok(url)
}

/// Build one page of the citing-works URL.
///
/// Year bounds follow the search frontend's conventions: `as_ylo` appears
/// only when a start year was given, `as_yhi` only when the end year differs
/// from the current year.
fn build_cites_url(
    base_url: &str,
    paper_id: &str,
    start: usize,
    config: &ScrapeConfig,
) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/scholar", base_url))
        .map_err(|e| CiteError::Config(format!("Invalid base URL: {}", e)))?;
    {
        let mut params = url.query_pairs_mut();
        params.append_pair("start", &start.to_string());
        params.append_pair("cites", paper_id);
        params.append_pair("hl", "en");
        params.append_pair("as_sdt", "2005");
        params.append_pair("sciodt", "0,5");
        if let Some(year) = config.start_year {
            params.append_pair("as_ylo", &year.to_string());
        }
        if config.end_year != current_year() {
            params.append_pair("as_yhi", &config.end_year.to_string());
        }
    }
    Ok(url)
}

/// Fetch a page, escalating through the resolver when a bot check is served.
async fn fetch_html(
    client: &reqwest::Client,
    url: &Url,
    cookie_header: Option<&str>,
    resolver: &dyn CaptchaResolver,
) -> Result<String> {
    let html = fetch_page(client, url, cookie_header).await?;
    if is_bot_check(&html) {
        info!(url = %url, "Bot check detected, escalating");
        return resolver.resolve(url.as_str()).await;
    }
    Ok(html)
}

/// Plain HTTP fetch with browser-shaped headers and stored cookies.
async fn fetch_page(
    client: &reqwest::Client,
    url: &Url,
    cookie_header: Option<&str>,
) -> Result<String> {
    let mut request = client
        .get(url.as_str())
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.9")
        .header("Upgrade-Insecure-Requests", "1");

    if let Some(header) = cookie_header {
        request = request.header("Cookie", header);
    }

    let response = request.send().await?;

    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(CiteError::RateLimited(60));
    }
    if !status.is_success() {
        return Err(CiteError::Api {
            code: status.as_u16() as i32,
            message: format!("HTTP error: {}", status),
        });
    }

    response.text().await.map_err(CiteError::Network)
}

/// Scan a search-results page for the citation identifier.
///
/// Returns `Ok(None)` when no `cites=` anchor exists on the page.
fn paper_id_from_search_page(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"a[href*="cites="]"#)
        .map_err(|e| CiteError::Parse(e.to_string()))?;

    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if let Some(tail) = href.rsplit("cites=").next() {
            let id: &str = tail.split('&').next().unwrap_or(tail);
            if !id.is_empty() {
                return Ok(Some(id.to_string()));
            }
        }
    }
    Ok(None)
}

/// Parse the result blocks of one citing-works page into the set.
///
/// Every field falls back independently to its sentinel; a block missing its
/// metadata line still contributes a row.
fn parse_citation_blocks(html: &str, page_url: &str, set: &mut ResultSet) -> Result<()> {
    let document = Html::parse_document(html);

    let block_selector =
        Selector::parse("div.gs_or").map_err(|e| CiteError::Parse(e.to_string()))?;
    let link_selector = Selector::parse("h3 a").map_err(|e| CiteError::Parse(e.to_string()))?;
    let meta_selector =
        Selector::parse("div.gs_a").map_err(|e| CiteError::Parse(e.to_string()))?;

    for block in document.select(&block_selector) {
        let block_html = block.html();

        let (title, source) = match block.select(&link_selector).next() {
            Some(link) => (
                link.text().collect::<String>().trim().to_string(),
                link.value()
                    .attr("href")
                    .map(|h| h.to_string())
                    .unwrap_or_else(|| format!("Look manually at: {}", page_url)),
            ),
            None => (
                "Could not catch title".to_string(),
                format!("Look manually at: {}", page_url),
            ),
        };

        let meta = block
            .select(&meta_selector)
            .next()
            .map(|m| m.text().collect::<String>())
            .unwrap_or_default();

        let citations = extract::citation_count(&block_html).unwrap_or_else(|| {
            warn!(title = %title, "Number of citations not found, appending 0");
            0
        });
        let year = extract::year(&meta);
        if year == 0 {
            debug!(title = %title, "Year not found, appending 0");
        }
        let author = extract::author(&meta).unwrap_or_else(|| "Author not found".to_string());
        let publisher = if meta.is_empty() {
            "Publisher not found".to_string()
        } else {
            extract::publisher(&meta)
        };
        let venue = extract::venue(&meta).unwrap_or_else(|| "Venue not found".to_string());

        set.push(CitationRecord {
            rank: 0, // assigned by the set
            author,
            title,
            citations,
            year,
            publisher,
            venue,
            source,
            citations_per_year: 0,
        });
    }

    Ok(())
}
