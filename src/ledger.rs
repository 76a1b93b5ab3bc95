//! Booking ledger: the only writer of classes and bookings.
//!
//! A booking is admitted inside a single `BEGIN IMMEDIATE` transaction. The
//! write lock is held from before the class is loaded until commit, so two
//! admissions can never both observe the same occupancy and both insert.
//! The ledger holds nothing but the pool handle and never logs; callers
//! decide how outcomes are reported.

use std::time::Duration;

use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::StorageError;
use crate::models::{BookingId, Class, ClassId};
use crate::schema::ensure_schema;

pub const DEFAULT_BUSY_RETRIES: u32 = 3;
const BUSY_BACKOFF: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Class not found")]
    ClassNotFound,
    #[error("No class is available on the given date")]
    InvalidDateRange,
    #[error("Class is full")]
    ClassFull,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<sqlx::Error> for BookingError {
    fn from(value: sqlx::Error) -> Self {
        StorageError::from(value).into()
    }
}

#[derive(Clone, Debug)]
pub struct Ledger {
    pool: SqlitePool,
    busy_retries: u32,
}

impl Ledger {
    /// Brings the schema up to date and wraps the pool.
    pub async fn new(pool: SqlitePool) -> Result<Self, StorageError> {
        ensure_schema(&pool).await?;
        Ok(Self {
            pool,
            busy_retries: DEFAULT_BUSY_RETRIES,
        })
    }

    pub fn with_busy_retries(mut self, busy_retries: u32) -> Self {
        self.busy_retries = busy_retries;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// `start_date` and `end_date` are epoch seconds. Callers validate that
    /// the name is non-empty, capacity is positive and the range is ordered.
    pub async fn create_class(
        &self,
        name: &str,
        start_date: i64,
        end_date: i64,
        capacity: u32,
    ) -> Result<ClassId, StorageError> {
        let result = sqlx::query(
            "INSERT INTO classes (name, start_date, end_date, capacity) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(start_date)
        .bind(end_date)
        .bind(i64::from(capacity))
        .execute(&self.pool)
        .await?;

        // AUTOINCREMENT rowids start at 1.
        Ok(result.last_insert_rowid() as ClassId)
    }

    /// Admits a booking for `date` (epoch seconds, already normalized to the
    /// day by the caller). Retries the whole transaction while the database
    /// stays locked past its busy timeout, up to the configured budget.
    pub async fn create_booking(
        &self,
        class_id: ClassId,
        member_name: &str,
        date: i64,
    ) -> Result<BookingId, BookingError> {
        // Ids above i64::MAX cannot exist in the store.
        let Ok(class_key) = i64::try_from(class_id) else {
            return Err(BookingError::ClassNotFound);
        };

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.admit(class_key, member_name, date).await {
                Err(BookingError::Storage(StorageError::Database(err))) if is_busy(&err) => {
                    if attempts > self.busy_retries {
                        return Err(StorageError::Busy { attempts }.into());
                    }
                    tokio::time::sleep(BUSY_BACKOFF * attempts).await;
                }
                outcome => return outcome,
            }
        }
    }

    async fn admit(
        &self,
        class_id: i64,
        member_name: &str,
        date: i64,
    ) -> Result<BookingId, BookingError> {
        // Dropping `tx` on any early return rolls it back.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let window: Option<(i64, i64, i64)> =
            sqlx::query_as("SELECT start_date, end_date, capacity FROM classes WHERE id = ?")
                .bind(class_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((start_date, end_date, capacity)) = window else {
            return Err(BookingError::ClassNotFound);
        };

        if date < start_date || date > end_date {
            return Err(BookingError::InvalidDateRange);
        }

        let occupancy: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE class_id = ? AND date = ?")
                .bind(class_id)
                .bind(date)
                .fetch_one(&mut *tx)
                .await?;
        if occupancy >= capacity {
            return Err(BookingError::ClassFull);
        }

        let result =
            sqlx::query("INSERT INTO bookings (class_id, member_name, date) VALUES (?, ?, ?)")
                .bind(class_id)
                .bind(member_name)
                .bind(date)
                .execute(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(result.last_insert_rowid() as BookingId)
    }

    /// Number of committed bookings for `class_id` on exactly `date`.
    pub async fn occupancy(&self, class_id: ClassId, date: i64) -> Result<u32, StorageError> {
        let Ok(class_key) = i64::try_from(class_id) else {
            return Ok(0);
        };
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE class_id = ? AND date = ?")
                .bind(class_key)
                .bind(date)
                .fetch_one(&self.pool)
                .await?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    pub async fn get_class(&self, class_id: ClassId) -> Result<Option<Class>, StorageError> {
        let Ok(class_key) = i64::try_from(class_id) else {
            return Ok(None);
        };
        let class = sqlx::query_as::<_, Class>(
            "SELECT id, name, start_date, end_date, capacity FROM classes WHERE id = ?",
        )
        .bind(class_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(class)
    }
}

/// SQLITE_BUSY / SQLITE_LOCKED and their extended codes.
fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(
            db.code().as_deref(),
            Some("5" | "6" | "261" | "262" | "517" | "773")
        ),
        _ => false,
    }
}
