//! Persistence seam for queue entries and barbers.
//!
//! Backends only promise per-record consistency. Multi-record invariants
//! (dense positions, one entry per chair) are held by running every
//! read-modify-write under the [`ShopStore`] lock.

pub mod memory;
pub mod postgres;
pub mod retry;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};

use crate::interceptors::AppResult;
use crate::models::{Barber, BarberStatus, QueueEntry, QueueStatus};

pub use memory::{MemoryBarberStore, MemoryQueueEntryStore};
pub use postgres::{PgBarberStore, PgQueueEntryStore};
pub use retry::RetryPolicy;

/// Storage for queue entries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueEntryStore: Send + Sync {
    async fn insert(&self, entry: &QueueEntry) -> AppResult<()>;

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QueueEntry>>;

    async fn update(&self, entry: &QueueEntry) -> AppResult<()>;

    /// Returns false when nothing was deleted
    async fn delete(&self, id: &str) -> AppResult<bool>;

    /// Entries with the given status, ordered by position ascending (ties by join time)
    async fn find_by_status(&self, status: QueueStatus) -> AppResult<Vec<QueueEntry>>;

    async fn count_by_status(&self, status: QueueStatus) -> AppResult<u64>;
}

/// Storage for barbers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BarberStore: Send + Sync {
    async fn insert(&self, barber: &Barber) -> AppResult<()>;

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Barber>>;

    /// All barbers ordered by chair number
    async fn find_all(&self) -> AppResult<Vec<Barber>>;

    async fn update(&self, barber: &Barber) -> AppResult<()>;

    async fn delete(&self, id: &str) -> AppResult<bool>;

    async fn find_by_status(&self, status: BarberStatus) -> AppResult<Vec<Barber>>;

    async fn count_all(&self) -> AppResult<u64>;

    async fn count_by_status(&self, status: BarberStatus) -> AppResult<u64>;
}

/// Proof that the shop-wide lock is held.
///
/// Methods taking `&StoreGuard` expect to run inside the caller's critical section.
pub struct StoreGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

/// The single shared store, built once at startup and cloned into every component
#[derive(Clone)]
pub struct ShopStore {
    entries: Arc<dyn QueueEntryStore>,
    barbers: Arc<dyn BarberStore>,
    lock: Arc<Mutex<()>>,
}

impl ShopStore {
    pub fn new(entries: Arc<dyn QueueEntryStore>, barbers: Arc<dyn BarberStore>) -> Self {
        Self {
            entries,
            barbers,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// In-memory store for development and tests
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryQueueEntryStore::new()),
            Arc::new(MemoryBarberStore::new()),
        )
    }

    /// Serialize against every other queue or barber mutation
    pub async fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            _guard: self.lock.lock().await,
        }
    }

    pub fn entries(&self) -> &dyn QueueEntryStore {
        self.entries.as_ref()
    }

    pub fn barbers(&self) -> &dyn BarberStore {
        self.barbers.as_ref()
    }
}
