//! # Summary Harness CLI (`summ`)
//!
//! The `summ` binary extracts text from web articles and local documents,
//! summarizes it with a language model, and saves or exports the result.
//!
//! ## Usage
//!
//! ```bash
//! summ --config ./config/summ.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `summ init` | Create the summary table if it does not exist |
//! | `summ extract <source>` | Print the text extracted from one source |
//! | `summ summarize <sources>...` | Summarize sources; print, save or export |
//! | `summ query` | List saved summaries, newest first |
//!
//! ## Examples
//!
//! ```bash
//! # Summarize two articles in English as bullet points and store them
//! summ summarize https://example.com/a https://example.com/b \
//!     --language english --style "bullet points" --save-to-db
//!
//! # Summarize a local report into a Word document
//! summ summarize ./report.pdf -o ./out/report-summary.docx
//!
//! # Show the three most recent bullet-point summaries from example.com
//! summ query --url-contains example.com --style "bullet points" --limit 3
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use summary_harness::models::SummaryQuery;
use summary_harness::store::SummaryStore;
use summary_harness::{config, ingest, query_cmd, summarize_cmd};

/// Summary Harness CLI: summarize web articles and PDF, DOCX or XLSX files
/// with a language model, and keep a queryable history of the results.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/summ.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "summ",
    about = "Summary Harness — multi-format text extraction and LLM summarization",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/summ.toml`. The database location, the summary
    /// table layout, and fetch and summarizer settings are read from it.
    #[arg(long, global = true, default_value = "./config/summ.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the summary table.
    ///
    /// Creates the SQLite database file and the configured table. This
    /// command is idempotent — running it multiple times is safe.
    Init,

    /// Extract and print the text of one source.
    ///
    /// Useful for checking what would be sent to the summarizer.
    Extract {
        /// URL (http/https) or local .pdf, .docx or .xlsx file.
        source: String,
    },

    /// Summarize one or more sources.
    ///
    /// Each source is extracted, summarized, printed, and optionally saved
    /// or exported. A failing source is logged and skipped.
    Summarize {
        /// One or more URLs or local file paths (PDF, DOCX, XLSX).
        #[arg(required = true)]
        sources: Vec<String>,

        /// Language of the summary (e.g. `english`).
        #[arg(short, long, default_value = "português")]
        language: String,

        /// Style of the summary (e.g. `bullet points`).
        #[arg(short, long, default_value = "a concise paragraph")]
        style: String,

        /// Base filename to export each summary to (.txt, .pdf, .docx, .xlsx, .png, .jpg).
        /// With several sources, `_<index>` is appended to the file stem.
        #[arg(short, long, conflicts_with = "save_to_db")]
        output_file: Option<PathBuf>,

        /// Save each summary to the database.
        #[arg(long = "save-to-db", visible_alias = "db")]
        save_to_db: bool,
    },

    /// Query saved summaries, newest first.
    Query {
        /// Maximum number of summaries to show.
        #[arg(short, long, default_value_t = 5)]
        limit: i64,

        /// Only summaries whose source URL contains this string.
        #[arg(short, long)]
        url_contains: Option<String>,

        /// Only summaries with exactly this style.
        #[arg(short, long)]
        style: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            SummaryStore::new(&cfg).ensure_schema().await?;
            println!("Database initialized successfully.");
        }
        Commands::Extract { source } => {
            ingest::run_extract(&cfg, &source).await?;
        }
        Commands::Summarize {
            sources,
            language,
            style,
            output_file,
            save_to_db,
        } => {
            summarize_cmd::run_summarize(&cfg, &sources, &language, &style, output_file, save_to_db)
                .await?;
        }
        Commands::Query {
            limit,
            url_contains,
            style,
        } => {
            let filter = SummaryQuery {
                limit: Some(limit),
                url_contains,
                style,
            };
            query_cmd::run_query(&cfg, &filter).await?;
        }
    }

    Ok(())
}
