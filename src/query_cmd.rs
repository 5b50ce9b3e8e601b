//! `summ query`: list stored summaries, newest first.

use anyhow::Result;

use crate::config::Config;
use crate::models::{SummaryQuery, SummaryRecord, SummaryText};
use crate::store::SummaryStore;

/// CLI entry point — runs the query and prints each record to stdout.
pub async fn run_query(config: &Config, filter: &SummaryQuery) -> Result<()> {
    let store = SummaryStore::new(config);
    let records = store.query(filter).await?;

    if records.is_empty() {
        println!("No summaries found matching your criteria.");
        return Ok(());
    }

    for record in &records {
        print_record(record);
    }
    Ok(())
}

fn print_record(record: &SummaryRecord) {
    println!("--- Summary ID: {} ---", record.id);
    println!("url:        {}", record.source_url);
    println!("language:   {}", record.language);
    println!("style:      {}", record.style);
    println!(
        "created_at: {}",
        record.created_at.format("%Y-%m-%dT%H:%M:%SZ")
    );
    let summary = match &record.summary_text {
        SummaryText::Raw(raw) => raw.clone(),
        decoded => decoded
            .main_summary()
            .map(str::to_string)
            .or_else(|| decoded.as_value().map(|v| v.to_string()))
            .unwrap_or_else(|| "[No summary text found]".to_string()),
    };
    println!("summary:    {}", summary);
    println!();
}
