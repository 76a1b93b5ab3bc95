//! Table definitions for classes and bookings.

use sqlx::SqlitePool;

use crate::db::StorageError;

const STATEMENTS: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS classes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        start_date INTEGER NOT NULL,
        end_date INTEGER NOT NULL,
        capacity INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS bookings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        class_id INTEGER NOT NULL,
        member_name TEXT NOT NULL,
        date INTEGER NOT NULL,
        FOREIGN KEY (class_id) REFERENCES classes(id)
    )",
    "CREATE INDEX IF NOT EXISTS bookings_class_date_idx ON bookings (class_id, date)",
];

/// Creates any missing tables and indexes. Existing rows are never touched.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    let mut tx = pool.begin().await?;
    for statement in STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}
