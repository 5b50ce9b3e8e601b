//! Batch summarization: extract → summarize → save or export, per source.
//!
//! A failure on one source is logged and the batch moves on; only setup
//! failures (configuration, missing API key) abort the command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::export::{Exporter, FileExporter};
use crate::ingest::{format_chain, Extractor};
use crate::models::NewSummary;
use crate::sources;
use crate::store::SummaryStore;
use crate::summarizer::{self, Summarizer};

/// Where each successful summary goes besides stdout.
pub enum Destination<'a> {
    None,
    Store(&'a SummaryStore),
    File {
        exporter: &'a dyn Exporter,
        base: PathBuf,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub summarized: usize,
    pub failed: usize,
}

/// Output path for source `index` of `total`: `base` itself for a single
/// source, otherwise `<stem>_<index>.<ext>` next to it.
pub fn numbered_output(base: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_{}", stem, index),
    };
    base.with_file_name(name)
}

/// Run the pipeline over `inputs`, never stopping early on a per-source
/// failure.
pub async fn process_sources(
    extractor: &Extractor,
    provider: &dyn Summarizer,
    destination: &Destination<'_>,
    inputs: &[String],
    language: &str,
    style: &str,
) -> BatchReport {
    let mut report = BatchReport::default();
    let total = inputs.len();

    for (i, source) in inputs.iter().enumerate() {
        info!("processing source {}/{}: {}", i + 1, total, source);

        let text = match extractor.extract_text(source).await {
            Ok(text) if text.trim().is_empty() => {
                warn!(source = %source, "skipping: extracted text is empty");
                report.failed += 1;
                continue;
            }
            Ok(text) => text,
            Err(e) => {
                warn!(source = %source, error = %format_chain(&e), "skipping: text extraction failed");
                report.failed += 1;
                continue;
            }
        };

        let result = summarizer::summarize(provider, &text, language, style).await;
        if result.error {
            error!(source = %source, reason = %result.main_summary, "could not summarize");
            report.failed += 1;
            continue;
        }

        println!("--- Summary: {} (style: {}) ---", source, style);
        println!("{}", result.main_summary);
        println!();

        match destination {
            Destination::None => {}
            Destination::Store(store) => {
                let payload = match serde_json::to_value(&result) {
                    Ok(v) => v,
                    Err(e) => {
                        error!(source = %source, error = %e, "could not encode summary");
                        report.failed += 1;
                        continue;
                    }
                };
                let input = NewSummary {
                    source_url: sources::source_uri(source),
                    summary_text: payload,
                    style: style.to_string(),
                    language: language.to_string(),
                };
                if let Err(e) = store.save(&input).await {
                    error!(source = %source, error = %format_chain(&e), "failed to save summary");
                    report.failed += 1;
                    continue;
                }
            }
            Destination::File { exporter, base } => {
                let path = numbered_output(base, i, total);
                if let Err(e) = exporter.export(&result.main_summary, &path) {
                    error!(source = %source, error = %format!("{:#}", e), "failed to export summary");
                    report.failed += 1;
                    continue;
                }
            }
        }

        report.summarized += 1;
    }

    report
}

/// CLI entry point for `summ summarize`.
pub async fn run_summarize(
    config: &Config,
    inputs: &[String],
    language: &str,
    style: &str,
    output: Option<PathBuf>,
    save_to_db: bool,
) -> Result<()> {
    let extractor = Extractor::new(config)?;
    let provider = summarizer::create_summarizer(&config.summarizer)?;

    let store;
    let exporter = FileExporter;
    let destination = if save_to_db {
        store = SummaryStore::new(config);
        Destination::Store(&store)
    } else if let Some(base) = output {
        Destination::File {
            exporter: &exporter,
            base,
        }
    } else {
        Destination::None
    };

    let report = process_sources(
        &extractor,
        provider.as_ref(),
        &destination,
        inputs,
        language,
        style,
    )
    .await;

    println!(
        "summarized: {}, failed: {}",
        report.summarized, report.failed
    );
    Ok(())
}
