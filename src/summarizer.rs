//! Summarizer collaborator.
//!
//! The [`Summarizer`] trait is the seam to the language model; [`summarize`]
//! wraps any implementation and normalizes every outcome into a
//! [`SummaryResult`] value, so callers never see a provider error directly.
//!
//! # Supported Providers
//!
//! | Config Value | Provider |
//! |-------------|----------|
//! | `"gemini"` | [`GeminiSummarizer`] |

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::SummarizerConfig;

pub const EMPTY_INPUT_MESSAGE: &str = "Error: No text to summarize.";
pub const EMPTY_RESPONSE_MESSAGE: &str = "Warning: Received an empty summary.";

/// One summarization request handed to a provider.
#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    pub text: &'a str,
    pub language: &'a str,
    pub style: &'a str,
}

impl SummaryRequest<'_> {
    /// The prompt sent to text-generation providers.
    pub fn prompt(&self) -> String {
        format!(
            "Please summarize the following article in {}. \
             The summary style should be: '{}'.\n\n\
             -- ARTICLE START --\n{}\n-- ARTICLE END --",
            self.language, self.style, self.text
        )
    }
}

/// Outcome of one summarization, persisted as the record's `summary_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub main_summary: String,
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_requested: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_requested: Option<String>,
}

impl SummaryResult {
    fn failure(message: String) -> Self {
        Self {
            main_summary: message,
            error: true,
            style_requested: None,
            language_requested: None,
        }
    }
}

/// A text-generation backend.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Provider name for logs (e.g. `"gemini"`).
    fn name(&self) -> &str;

    /// Produce summary text for `request`. May return an empty string.
    async fn generate(&self, request: &SummaryRequest<'_>) -> Result<String>;
}

/// Summarize `text`, folding every failure into the result value.
///
/// Blank input is rejected without calling the provider.
pub async fn summarize(
    summarizer: &dyn Summarizer,
    text: &str,
    language: &str,
    style: &str,
) -> SummaryResult {
    if text.trim().is_empty() {
        warn!("no text provided for summarization");
        return SummaryResult::failure(EMPTY_INPUT_MESSAGE.to_string());
    }

    info!(
        provider = summarizer.name(),
        language, style, "sending text for summarization"
    );
    let request = SummaryRequest {
        text,
        language,
        style,
    };

    match summarizer.generate(&request).await {
        Ok(summary) if summary.trim().is_empty() => {
            warn!("summarization returned an empty response");
            SummaryResult {
                main_summary: EMPTY_RESPONSE_MESSAGE.to_string(),
                error: false,
                style_requested: None,
                language_requested: None,
            }
        }
        Ok(summary) => SummaryResult {
            main_summary: summary,
            error: false,
            style_requested: Some(style.to_string()),
            language_requested: Some(language.to_string()),
        },
        Err(e) => {
            error!(provider = summarizer.name(), error = %format!("{:#}", e), "summarization failed");
            SummaryResult::failure(format!(
                "An error occurred during summarization: {:#}",
                e
            ))
        }
    }
}

// ============ Gemini Provider ============

/// Summarizer backed by the Gemini `generateContent` REST endpoint.
///
/// The API key is read from the environment variable named by
/// `summarizer.api_key_env` (default `GOOGLE_API_KEY`).
pub struct GeminiSummarizer {
    model: String,
    api_key: String,
    client: reqwest::Client,
}

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

impl GeminiSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "{} environment variable not set (check your .env file)",
                    config.api_key_env
                )
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            client,
        })
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &SummaryRequest<'_>) -> Result<String> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": request.prompt() }] }],
        });

        let response = self
            .client
            .post(format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Gemini API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        Ok(parse_gemini_response(&json))
    }
}

/// Concatenate the text parts of the first candidate; empty when absent.
fn parse_gemini_response(json: &serde_json::Value) -> String {
    json.pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Create the configured [`Summarizer`].
pub fn create_summarizer(config: &SummarizerConfig) -> Result<Box<dyn Summarizer>> {
    match config.provider.as_str() {
        "gemini" => Ok(Box::new(GeminiSummarizer::new(config)?)),
        other => bail!("Unknown summarizer provider: {}", other),
    }
}
