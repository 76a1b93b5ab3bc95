//! SQLite connection pool shared by every ledger call.
//!
//! Writers are serialized by SQLite itself. `busy_timeout` bounds how long a
//! connection waits for the write lock before the statement fails with
//! `SQLITE_BUSY`, so no caller can hang on a contended database.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use thiserror::Error;

use crate::settings::DatabaseSettings;

pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("database stayed locked after {attempts} attempts")]
    Busy { attempts: u32 },
    #[error("failed to prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub async fn open_pool(settings: &DatabaseSettings) -> Result<SqlitePool, StorageError> {
    let (options, max_connections) = if settings.url == IN_MEMORY {
        // One connection, so every caller sees the same in-memory database.
        (SqliteConnectOptions::from_str("sqlite::memory:")?, 1)
    } else {
        let path = database_path(&settings.data_dir, &settings.url)?;
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        (options, settings.max_connections.max(1))
    };

    let options = options
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(settings.busy_timeout())
        .foreign_keys(true)
        .pragma("cache_size", "10000");

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(settings.acquire_timeout());
    if settings.url == IN_MEMORY {
        // The database lives only as long as its connection.
        pool_options = pool_options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }
    let pool = pool_options.connect_with(options).await?;

    tracing::debug!(
        url = %settings.url,
        max_connections,
        busy_timeout_ms = settings.busy_timeout_ms,
        "Database pool opened"
    );

    Ok(pool)
}

/// Resolves `name` to `<data_dir>/<stem>.db`, creating `data_dir` if needed.
fn database_path(data_dir: &Path, name: &str) -> Result<PathBuf, StorageError> {
    std::fs::create_dir_all(data_dir).map_err(|source| StorageError::DataDir {
        path: data_dir.to_path_buf(),
        source,
    })?;
    let stem = name.strip_suffix(".db").unwrap_or(name);
    Ok(data_dir.join(format!("{stem}.db")))
}

pub async fn ping(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_normalizes_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let with_ext = database_path(tmp.path(), "test.db").unwrap();
        let without_ext = database_path(tmp.path(), "test").unwrap();
        assert_eq!(with_ext, without_ext);
        assert_eq!(with_ext, tmp.path().join("test.db"));
    }

    #[test]
    fn test_database_path_creates_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let data_dir = tmp.path().join("nested").join(".local");
        database_path(&data_dir, "booking").unwrap();
        assert!(data_dir.is_dir());
    }

    #[tokio::test]
    async fn test_open_file_pool() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = DatabaseSettings {
            data_dir: tmp.path().to_path_buf(),
            ..DatabaseSettings::default()
        };

        let pool = open_pool(&settings).await.unwrap();
        ping(&pool).await.unwrap();

        let (foreign_keys,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(foreign_keys, 1);
        assert!(tmp.path().join("booking.db").exists());
    }

    #[tokio::test]
    async fn test_open_in_memory_pool() {
        let pool = open_pool(&DatabaseSettings::in_memory()).await.unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();
        // Same connection, same database.
        sqlx::query("INSERT INTO t DEFAULT VALUES")
            .execute(&pool)
            .await
            .unwrap();
    }
}
