//! SQLite connection setup.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::Config;

/// Open the configured database, creating the file and its parent directory
/// on first use.
///
/// WAL keeps readers unblocked while a segment replacement transaction is in
/// flight; foreign keys are enforced so a turn cannot be inserted for a chat
/// deleted out from under it.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db.max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    Ok(pool)
}
