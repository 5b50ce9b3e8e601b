//! Web article extraction: one GET, then paragraph text from the HTML.
//!
//! This is a heuristic, not a readability algorithm. The text of all `<p>`
//! elements is used; if there is none, the page's visible text is used
//! instead. Navigation and other boilerplate inside `<p>` is kept.

use std::time::Duration;

use anyhow::{Context, Result};
use scraper::{Html, Node, Selector};
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::extract::ExtractError;

/// Elements whose text never counts as visible.
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// HTTP client for single-page fetches.
pub struct WebFetcher {
    client: reqwest::Client,
}

impl WebFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    /// Fetch `url` and return its article text. Never retries.
    pub async fn fetch_text(&self, url: &str) -> Result<String, ExtractError> {
        let html = self.fetch_html(url).await?;
        Ok(html_to_text(&html))
    }

    async fn fetch_html(&self, url: &str) -> Result<String, ExtractError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Http {
                url: url.to_string(),
                status,
            });
        }
        debug!(url, %status, "fetched page");

        response.text().await.map_err(|e| transport_error(url, e))
    }
}

fn transport_error(url: &str, cause: reqwest::Error) -> ExtractError {
    if cause.is_timeout() {
        ExtractError::Timeout {
            url: url.to_string(),
            cause,
        }
    } else {
        ExtractError::Transport {
            url: url.to_string(),
            cause,
        }
    }
}

/// Paragraph text of `html`, or all visible text when it has no
/// non-blank paragraphs.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let paragraphs = paragraph_text(&document);
    if !paragraphs.trim().is_empty() {
        return paragraphs;
    }

    warn!("no <p> text found, falling back to whole-document text");
    visible_text(&document)
}

fn paragraph_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("p") else {
        return String::new();
    };
    document
        .select(&selector)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every visible text node, trimmed, blank ones dropped, one per line.
fn visible_text(document: &Html) -> String {
    let mut lines = Vec::new();
    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|el| INVISIBLE_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed);
        }
    }
    lines.join("\n")
}
