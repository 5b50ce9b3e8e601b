//! Summary record store.
//!
//! An append-only SQLite table whose name and column names come from
//! [`StoreConfig`]. All SQL text is built once in [`SummaryStore::new`]
//! from those validated identifiers; values supplied by callers are always
//! bound as parameters.
//!
//! Every operation opens its own connection and closes it before returning.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use sqlx::sqlite::SqliteConnection;
use sqlx::{Connection, Row};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, DbConfig, StoreConfig};
use crate::db;
use crate::models::{NewSummary, SummaryQuery, SummaryRecord, SummaryText};

/// Source of `created_at` stamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Fixed-width so lexical order in the column equals time order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database '{path}'")]
    Connect {
        path: String,
        #[source]
        cause: sqlx::Error,
    },

    #[error("database query failed")]
    Query(#[from] sqlx::Error),

    #[error("failed to encode summary_text")]
    Encode(#[from] serde_json::Error),
}

/// SQL text derived from the configured identifiers.
struct Statements {
    create_table: String,
    create_index: String,
    insert: String,
    select: String,
    url_filter: String,
    style_filter: String,
    order: String,
}

impl Statements {
    fn build(store: &StoreConfig) -> Self {
        let c = &store.columns;
        let table = quote(&store.table);
        let (id, url, text, style, lang, created) = (
            quote(&c.id),
            quote(&c.source_url),
            quote(&c.summary_text),
            quote(&c.style),
            quote(&c.language),
            quote(&c.created_at),
        );

        Self {
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS {table} (\
                 {id} INTEGER PRIMARY KEY AUTOINCREMENT, \
                 {url} TEXT NOT NULL, \
                 {text} TEXT NOT NULL, \
                 {style} TEXT NOT NULL, \
                 {lang} TEXT NOT NULL, \
                 {created} TEXT NOT NULL)"
            ),
            create_index: format!(
                "CREATE INDEX IF NOT EXISTS {} ON {table} ({created} DESC)",
                quote(&format!("idx_{}_{}", store.table, c.created_at))
            ),
            insert: format!(
                "INSERT INTO {table} ({url}, {text}, {style}, {lang}, {created}) \
                 VALUES (?, ?, ?, ?, ?)"
            ),
            select: format!("SELECT {id}, {url}, {text}, {style}, {lang}, {created} FROM {table}"),
            url_filter: format!("{url} LIKE ? ESCAPE '\\'"),
            style_filter: format!("{style} = ?"),
            order: format!("ORDER BY {created} DESC, {id} DESC"),
        }
    }
}

/// Identifiers are allow-listed at config load; quoting keeps keywords usable.
fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier)
}

/// Escape `LIKE` wildcards so the filter is a literal substring match.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses our own format, any RFC 3339 value, or a naive ISO timestamp
/// (taken as UTC), so pre-existing tables remain readable.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub struct SummaryStore {
    db: DbConfig,
    table: String,
    sql: Statements,
    clock: Clock,
}

impl SummaryStore {
    pub fn new(config: &Config) -> Self {
        Self {
            db: config.db.clone(),
            table: config.store.table.clone(),
            sql: Statements::build(&config.store),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the clock used to stamp `created_at`.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    async fn open(&self) -> Result<SqliteConnection, StoreError> {
        db::connect(&self.db)
            .await
            .map_err(|cause| StoreError::Connect {
                path: self.db.path.display().to_string(),
                cause,
            })
    }

    async fn close(conn: SqliteConnection) {
        if let Err(e) = conn.close().await {
            warn!(error = %e, "failed to close database connection");
        }
    }

    /// Create the backing table and its index if absent. Idempotent.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.open().await?;
        let result = self.ensure_schema_on(&mut conn).await;
        Self::close(conn).await;
        result
    }

    async fn ensure_schema_on(&self, conn: &mut SqliteConnection) -> Result<(), StoreError> {
        sqlx::query(&self.sql.create_table)
            .execute(&mut *conn)
            .await?;
        sqlx::query(&self.sql.create_index)
            .execute(&mut *conn)
            .await?;
        debug!(table = %self.table, "schema ready");
        Ok(())
    }

    /// Insert one record, stamping `created_at` from the store clock.
    ///
    /// The insert is a single statement, so a failure writes nothing.
    pub async fn save(&self, input: &NewSummary) -> Result<SummaryRecord, StoreError> {
        let encoded = serde_json::to_string(&input.summary_text)?;
        let created_at = (self.clock)().trunc_subsecs(6);

        let mut conn = self.open().await?;
        let result = self.insert_on(&mut conn, input, &encoded, &created_at).await;
        Self::close(conn).await;

        let id = result?;
        info!(id, source_url = %input.source_url, "summary saved");
        Ok(SummaryRecord {
            id,
            source_url: input.source_url.clone(),
            summary_text: SummaryText::Decoded(input.summary_text.clone()),
            style: input.style.clone(),
            language: input.language.clone(),
            created_at,
        })
    }

    async fn insert_on(
        &self,
        conn: &mut SqliteConnection,
        input: &NewSummary,
        encoded: &str,
        created_at: &DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        self.ensure_schema_on(conn).await?;
        let result = sqlx::query(&self.sql.insert)
            .bind(&input.source_url)
            .bind(encoded)
            .bind(&input.style)
            .bind(&input.language)
            .bind(format_timestamp(created_at))
            .execute(&mut *conn)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Records matching `filter`, newest first.
    pub async fn query(&self, filter: &SummaryQuery) -> Result<Vec<SummaryRecord>, StoreError> {
        let mut conn = self.open().await?;
        let result = self.query_on(&mut conn, filter).await;
        Self::close(conn).await;
        result
    }

    async fn query_on(
        &self,
        conn: &mut SqliteConnection,
        filter: &SummaryQuery,
    ) -> Result<Vec<SummaryRecord>, StoreError> {
        self.ensure_schema_on(conn).await?;

        let mut sql = self.sql.select.clone();
        let mut conditions: Vec<&str> = Vec::new();
        if filter.url_contains.is_some() {
            conditions.push(&self.sql.url_filter);
        }
        if filter.style.is_some() {
            conditions.push(&self.sql.style_filter);
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push(' ');
        sql.push_str(&self.sql.order);

        let limit = filter.limit.filter(|l| *l > 0);
        if limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query(&sql);
        if let Some(ref needle) = filter.url_contains {
            query = query.bind(like_pattern(needle));
        }
        if let Some(ref style) = filter.style {
            query = query.bind(style.clone());
        }
        if let Some(limit) = limit {
            query = query.bind(limit);
        }

        let rows = query.fetch_all(&mut *conn).await?;
        rows.iter().map(record_from_row).collect()
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<SummaryRecord, StoreError> {
    let id: i64 = row.try_get(0)?;
    let raw_text: String = row.try_get(2)?;
    let created_raw: String = row.try_get(5)?;

    let summary_text = match serde_json::from_str(&raw_text) {
        Ok(value) => SummaryText::Decoded(value),
        Err(e) => {
            warn!(id, error = %e, "could not decode summary_text, returning raw text");
            SummaryText::Raw(raw_text)
        }
    };

    let created_at = parse_timestamp(&created_raw).unwrap_or_else(|| {
        warn!(id, value = %created_raw, "unreadable created_at, using the minimum timestamp");
        DateTime::<Utc>::MIN_UTC
    });

    Ok(SummaryRecord {
        id,
        source_url: row.try_get(1)?,
        summary_text,
        style: row.try_get::<Option<String>, _>(3)?.unwrap_or_default(),
        language: row.try_get::<Option<String>, _>(4)?.unwrap_or_default(),
        created_at,
    })
}
