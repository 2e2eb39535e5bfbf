use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use sqlx::PgPool;

use super::retry::RetryPolicy;
use super::{BarberStore, QueueEntryStore};
use crate::interceptors::{AppError, AppResult};
use crate::models::{Barber, BarberRow, BarberStatus, QueueEntry, QueueEntryRow, QueueStatus};

const ENTRY_COLUMNS: &str =
    "id, customer_name, service_type, status, barber_id, joined_at, position";
const BARBER_COLUMNS: &str = "id, name, phone, chair_no, status, current_entry_id";

/// Check the outcome of an `INSERT .. ON CONFLICT (id) DO NOTHING`.
///
/// A conflict on a retried insert means an earlier attempt committed before
/// its connection dropped. A conflict on the first attempt is a real duplicate.
fn confirm_insert(table: &str, id: &str, rows_affected: u64, attempts: u32) -> AppResult<()> {
    match (rows_affected, attempts) {
        (0, 0 | 1) => Err(AppError::StorageError(format!(
            "{} row {} already exists",
            table, id
        ))),
        (0, _) => {
            tracing::debug!(
                "{} row {} was written by an earlier attempt ({} attempts)",
                table,
                id,
                attempts
            );
            Ok(())
        }
        _ => Ok(()),
    }
}

/// `queue_entries` table
#[derive(Clone)]
pub struct PgQueueEntryStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgQueueEntryStore {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }
}

#[async_trait]
impl QueueEntryStore for PgQueueEntryStore {
    async fn insert(&self, entry: &QueueEntry) -> AppResult<()> {
        let pool = &self.pool;
        let position = entry.position.map(|p| p as i32);
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result = self
            .retry
            .run("insert_queue_entry", move || {
                attempts.fetch_add(1, Ordering::Relaxed);
                sqlx::query(
                    "INSERT INTO queue_entries (id, customer_name, service_type, status, barber_id, joined_at, position)
                     VALUES ($1, $2, $3, $4, $5, $6, $7)
                     ON CONFLICT (id) DO NOTHING",
                )
                .bind(entry.id.as_str())
                .bind(entry.customer_name.as_str())
                .bind(entry.service_type.as_str())
                .bind(entry.status.as_str())
                .bind(entry.barber_id.as_deref())
                .bind(entry.joined_at)
                .bind(position)
                .execute(pool)
            })
            .await?;
        confirm_insert(
            "queue_entries",
            &entry.id,
            result.rows_affected(),
            counter.load(Ordering::Relaxed),
        )
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QueueEntry>> {
        let pool = &self.pool;
        let query = format!("SELECT {} FROM queue_entries WHERE id = $1", ENTRY_COLUMNS);
        let row = self
            .retry
            .run("find_queue_entry", || {
                sqlx::query_as::<_, QueueEntryRow>(&query)
                    .bind(id)
                    .fetch_optional(pool)
            })
            .await?;

        row.map(QueueEntry::try_from).transpose()
    }

    async fn update(&self, entry: &QueueEntry) -> AppResult<()> {
        let pool = &self.pool;
        let position = entry.position.map(|p| p as i32);
        self.retry
            .run("update_queue_entry", move || {
                sqlx::query(
                    "UPDATE queue_entries
                     SET customer_name = $2, service_type = $3, status = $4, barber_id = $5, joined_at = $6, position = $7
                     WHERE id = $1",
                )
                .bind(entry.id.as_str())
                .bind(entry.customer_name.as_str())
                .bind(entry.service_type.as_str())
                .bind(entry.status.as_str())
                .bind(entry.barber_id.as_deref())
                .bind(entry.joined_at)
                .bind(position)
                .execute(pool)
            })
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let pool = &self.pool;
        let result = self
            .retry
            .run("delete_queue_entry", move || {
                sqlx::query("DELETE FROM queue_entries WHERE id = $1")
                    .bind(id)
                    .execute(pool)
            })
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_status(&self, status: QueueStatus) -> AppResult<Vec<QueueEntry>> {
        let pool = &self.pool;
        let query = format!(
            "SELECT {} FROM queue_entries WHERE status = $1 ORDER BY position ASC NULLS LAST, joined_at ASC",
            ENTRY_COLUMNS
        );
        let rows = self
            .retry
            .run("find_queue_entries_by_status", || {
                sqlx::query_as::<_, QueueEntryRow>(&query)
                    .bind(status.as_str())
                    .fetch_all(pool)
            })
            .await?;

        rows.into_iter().map(QueueEntry::try_from).collect()
    }

    async fn count_by_status(&self, status: QueueStatus) -> AppResult<u64> {
        let pool = &self.pool;
        let count = self
            .retry
            .run("count_queue_entries_by_status", move || {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM queue_entries WHERE status = $1")
                    .bind(status.as_str())
                    .fetch_one(pool)
            })
            .await?;
        Ok(count.max(0) as u64)
    }
}

/// `barbers` table
#[derive(Clone)]
pub struct PgBarberStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgBarberStore {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }
}

#[async_trait]
impl BarberStore for PgBarberStore {
    async fn insert(&self, barber: &Barber) -> AppResult<()> {
        let pool = &self.pool;
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result = self
            .retry
            .run("insert_barber", move || {
                attempts.fetch_add(1, Ordering::Relaxed);
                sqlx::query(
                    "INSERT INTO barbers (id, name, phone, chair_no, status, current_entry_id)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     ON CONFLICT (id) DO NOTHING",
                )
                .bind(barber.id.as_str())
                .bind(barber.name.as_str())
                .bind(barber.phone.as_deref())
                .bind(barber.chair_no)
                .bind(barber.status.as_str())
                .bind(barber.current_entry_id.as_deref())
                .execute(pool)
            })
            .await?;
        confirm_insert(
            "barbers",
            &barber.id,
            result.rows_affected(),
            counter.load(Ordering::Relaxed),
        )
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Barber>> {
        let pool = &self.pool;
        let query = format!("SELECT {} FROM barbers WHERE id = $1", BARBER_COLUMNS);
        let row = self
            .retry
            .run("find_barber", || {
                sqlx::query_as::<_, BarberRow>(&query)
                    .bind(id)
                    .fetch_optional(pool)
            })
            .await?;

        row.map(Barber::try_from).transpose()
    }

    async fn find_all(&self) -> AppResult<Vec<Barber>> {
        let pool = &self.pool;
        let query = format!("SELECT {} FROM barbers ORDER BY chair_no ASC, name ASC", BARBER_COLUMNS);
        let rows = self
            .retry
            .run("find_all_barbers", || {
                sqlx::query_as::<_, BarberRow>(&query).fetch_all(pool)
            })
            .await?;

        rows.into_iter().map(Barber::try_from).collect()
    }

    async fn update(&self, barber: &Barber) -> AppResult<()> {
        let pool = &self.pool;
        self.retry
            .run("update_barber", move || {
                sqlx::query(
                    "UPDATE barbers
                     SET name = $2, phone = $3, chair_no = $4, status = $5, current_entry_id = $6
                     WHERE id = $1",
                )
                .bind(barber.id.as_str())
                .bind(barber.name.as_str())
                .bind(barber.phone.as_deref())
                .bind(barber.chair_no)
                .bind(barber.status.as_str())
                .bind(barber.current_entry_id.as_deref())
                .execute(pool)
            })
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let pool = &self.pool;
        let result = self
            .retry
            .run("delete_barber", move || {
                sqlx::query("DELETE FROM barbers WHERE id = $1")
                    .bind(id)
                    .execute(pool)
            })
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_by_status(&self, status: BarberStatus) -> AppResult<Vec<Barber>> {
        let pool = &self.pool;
        let query = format!(
            "SELECT {} FROM barbers WHERE status = $1 ORDER BY chair_no ASC, name ASC",
            BARBER_COLUMNS
        );
        let rows = self
            .retry
            .run("find_barbers_by_status", || {
                sqlx::query_as::<_, BarberRow>(&query)
                    .bind(status.as_str())
                    .fetch_all(pool)
            })
            .await?;

        rows.into_iter().map(Barber::try_from).collect()
    }

    async fn count_all(&self) -> AppResult<u64> {
        let pool = &self.pool;
        let count = self
            .retry
            .run("count_barbers", move || {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM barbers").fetch_one(pool)
            })
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn count_by_status(&self, status: BarberStatus) -> AppResult<u64> {
        let pool = &self.pool;
        let count = self
            .retry
            .run("count_barbers_by_status", move || {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM barbers WHERE status = $1")
                    .bind(status.as_str())
                    .fetch_one(pool)
            })
            .await?;
        Ok(count.max(0) as u64)
    }
}
