//! Bot-detection escalation.
//!
//! Scholar intermittently serves a captcha page instead of results. The
//! scraper treats that as a capability it was handed, not a code path it
//! owns: a [`CaptchaResolver`] takes the blocked URL and returns the resumed
//! page content. The interactive [`PromptResolver`] asks a human to clear
//! the check in a browser session sharing the stored cookies; test suites
//! substitute fixture resolvers.

use crate::error::{CiteError, Result};
use async_trait::async_trait;
use std::io::Write;

/// Phrases whose presence in a response body marks a bot-detection page.
pub const BOT_CHECK_PHRASES: [&str; 3] = [
    "unusual traffic from your computer network",
    "not a robot",
    "grecaptcha",
];

/// Whether a response body is a bot-detection page rather than results.
pub fn is_bot_check(html: &str) -> bool {
    BOT_CHECK_PHRASES.iter().any(|phrase| html.contains(phrase))
}

/// Capability for turning a blocked URL into resumed page content.
#[async_trait]
pub trait CaptchaResolver: Send + Sync {
    /// Resolve the bot check for `url` and return the page content that a
    /// subsequent request observed. Implementations may block indefinitely
    /// on human interaction.
    async fn resolve(&self, url: &str) -> Result<String>;
}

/// Human-in-the-loop resolver: asks the user to clear the check in their
/// browser, then re-fetches the URL until the block is gone. There is no
/// retry budget or timeout on the manual wait.
pub struct PromptResolver {
    client: reqwest::Client,
}

impl PromptResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CaptchaResolver for PromptResolver {
    async fn resolve(&self, url: &str) -> Result<String> {
        loop {
            println!("Bot check detected. Open the URL below in a browser, solve the captcha,");
            println!("then press Enter here to continue:");
            println!("  {}", url);
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;

            let html = self.client.get(url).send().await?.text().await?;
            if !is_bot_check(&html) {
                return Ok(html);
            }
            println!("Still blocked, trying again...");
        }
    }
}

/// Resolver for non-interactive runs: reports the block as an error instead
/// of waiting on a human.
pub struct DenyResolver;

#[async_trait]
impl CaptchaResolver for DenyResolver {
    async fn resolve(&self, url: &str) -> Result<String> {
        Err(CiteError::BotDetection(url.to_string()))
    }
}
