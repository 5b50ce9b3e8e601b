//! Extraction facade.
//!
//! [`Extractor::extract_text`] is the single entry point for turning a
//! source string into text: it classifies the source once, runs the
//! matching extractor, and reports every failure as an [`ExtractError`]
//! regardless of which backend ran.

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::extract::{self, ExtractError, FileFormat};
use crate::sources::{self, SourceKind};
use crate::web::WebFetcher;

pub struct Extractor {
    web: WebFetcher,
}

impl Extractor {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            web: WebFetcher::new(&config.fetch)?,
        })
    }

    /// Extract normalized text from a URL or local file path.
    ///
    /// Empty text is a success; callers decide whether it is usable.
    pub async fn extract_text(&self, source: &str) -> Result<String, ExtractError> {
        let result = match sources::classify(source) {
            None => Err(ExtractError::NotFound(source.to_string())),
            Some(SourceKind::Url) => {
                info!(url = source, "extracting text from URL");
                self.web.fetch_text(source).await
            }
            Some(SourceKind::Pdf(path)) => extract::extract_file(&path, FileFormat::Pdf),
            Some(SourceKind::Docx(path)) => extract::extract_file(&path, FileFormat::Docx),
            Some(SourceKind::Xlsx(path)) => extract::extract_file(&path, FileFormat::Xlsx),
            Some(SourceKind::Unsupported(path, ext)) => Err(ExtractError::UnsupportedFormat {
                path: path.display().to_string(),
                ext,
            }),
        };

        match &result {
            Ok(text) => info!(source, chars = text.chars().count(), "extracted text"),
            Err(e) => warn!(source, error = %format_chain(e), "extraction failed"),
        }
        result
    }
}

/// Render an error with its `source()` chain, `outer: inner: root`.
pub fn format_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut cause = err.source();
    while let Some(c) = cause {
        out.push_str(": ");
        out.push_str(&c.to_string());
        cause = c.source();
    }
    out
}

/// CLI entry point for `summ extract`: print the text of one source.
pub async fn run_extract(config: &Config, source: &str) -> Result<()> {
    let extractor = Extractor::new(config)?;
    match extractor.extract_text(source).await {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", format_chain(&e));
            std::process::exit(1);
        }
    }
}
