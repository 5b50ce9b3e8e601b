use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
use sqlx::ConnectOptions;
use std::time::Duration;

use crate::config::DbConfig;

/// Open one SQLite connection for the duration of a single store operation.
///
/// Connections are not pooled; callers close them when the operation ends.
pub async fn connect(config: &DbConfig) -> Result<SqliteConnection, sqlx::Error> {
    let db_path = &config.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

    options.connect().await
}
