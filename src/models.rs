//! Core data models used throughout the summary harness.
//!
//! These types represent what flows from the summarizer into the store and
//! back out of it through queries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Input to [`SummaryStore::save`](crate::store::SummaryStore::save).
///
/// The store assigns `id` and `created_at`; callers never supply them.
#[derive(Debug, Clone)]
pub struct NewSummary {
    pub source_url: String,
    pub summary_text: Value,
    pub style: String,
    pub language: String,
}

/// The stored `summary_text` column, decoded when possible.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryText {
    Decoded(Value),
    /// Column content that is not valid JSON, returned as stored.
    Raw(String),
}

impl SummaryText {
    /// The `main_summary` field of a decoded summarizer payload, if any.
    pub fn main_summary(&self) -> Option<&str> {
        match self {
            SummaryText::Decoded(value) => match value {
                Value::String(s) => Some(s.as_str()),
                other => other.get("main_summary").and_then(Value::as_str),
            },
            SummaryText::Raw(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            SummaryText::Decoded(value) => Some(value),
            SummaryText::Raw(_) => None,
        }
    }
}

/// A persisted summary row. Never mutated after insert.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRecord {
    pub id: i64,
    pub source_url: String,
    pub summary_text: SummaryText,
    pub style: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

/// Filters for [`SummaryStore::query`](crate::store::SummaryStore::query).
#[derive(Debug, Clone, Default)]
pub struct SummaryQuery {
    /// Caps the result count after ordering; ignored unless positive.
    pub limit: Option<i64>,
    /// Substring match on `source_url`.
    pub url_contains: Option<String>,
    /// Exact match on `style`.
    pub style: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn main_summary_from_structured_payload() {
        let text = SummaryText::Decoded(json!({"main_summary": "short", "error": false}));
        assert_eq!(text.main_summary(), Some("short"));
    }

    #[test]
    fn main_summary_from_bare_string_payload() {
        let text = SummaryText::Decoded(json!("just text"));
        assert_eq!(text.main_summary(), Some("just text"));
    }

    #[test]
    fn raw_text_has_no_main_summary() {
        let text = SummaryText::Raw("{not json".to_string());
        assert_eq!(text.main_summary(), None);
        assert!(text.as_value().is_none());
    }
}
