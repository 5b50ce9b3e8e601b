//! # Summary Harness
//!
//! Multi-format text extraction, LLM summarization, and a queryable store
//! of summaries.
//!
//! Sources are web articles (HTTP/HTTPS) or local PDF, DOCX and XLSX files.
//! Each is reduced to plain text, handed to a [`summarizer::Summarizer`], and
//! the result is either saved to SQLite or exported to a file.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌────────────┐   ┌──────────┐
//! │  Source    │──▶│  Extractor   │──▶│ Summarizer │──▶│  SQLite  │
//! │ URL / file │   │ HTML/PDF/    │   │  (Gemini)  │   │  store   │
//! └────────────┘   │ DOCX/XLSX    │   └─────┬──────┘   └──────────┘
//!                  └──────────────┘         │
//!                                           ▼
//!                                     ┌──────────┐
//!                                     │  Export  │
//!                                     │ txt/pdf/ │
//!                                     │docx/xlsx/│
//!                                     │ png/jpg  │
//!                                     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! summ init                                   # create the summary table
//! summ extract report.pdf                     # print extracted text
//! summ summarize https://example.com/a -l english --save-to-db
//! summ summarize notes.docx -o out/summary.txt
//! summ query --url-contains example --limit 3
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and identifier validation |
//! | [`models`] | Summary records and query filters |
//! | [`sources`] | Source classification (URL vs. file format) |
//! | [`extract`] | PDF, DOCX and XLSX text extraction |
//! | [`web`] | Web page fetch and paragraph extraction |
//! | [`ingest`] | Extraction facade |
//! | [`store`] | SQLite summary store |
//! | [`summarizer`] | Summarizer trait and providers |
//! | [`export`] | File export of summaries |
//! | [`db`] | Database connection |

pub mod config;
pub mod db;
pub mod export;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod query_cmd;
pub mod sources;
pub mod store;
pub mod summarize_cmd;
pub mod summarizer;
pub mod web;
