use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BarberStore, QueueEntryStore};
use crate::interceptors::{AppError, AppResult};
use crate::models::{Barber, BarberStatus, QueueEntry, QueueStatus};

#[derive(Default)]
pub struct MemoryQueueEntryStore {
    entries: RwLock<HashMap<String, QueueEntry>>,
}

impl MemoryQueueEntryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueEntryStore for MemoryQueueEntryStore {
    async fn insert(&self, entry: &QueueEntry) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&entry.id) {
            return Err(AppError::StorageError(format!("Duplicate queue entry id {}", entry.id)));
        }
        entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QueueEntry>> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn update(&self, entry: &QueueEntry) -> AppResult<()> {
        match self.entries.write().await.get_mut(&entry.id) {
            Some(stored) => {
                *stored = entry.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Queue entry {} not found", entry.id))),
        }
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.entries.write().await.remove(id).is_some())
    }

    async fn find_by_status(&self, status: QueueStatus) -> AppResult<Vec<QueueEntry>> {
        let mut matching: Vec<QueueEntry> = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.joined_at.cmp(&b.joined_at))
        });
        Ok(matching)
    }

    async fn count_by_status(&self, status: QueueStatus) -> AppResult<u64> {
        let entries = self.entries.read().await;
        Ok(entries.values().filter(|e| e.status == status).count() as u64)
    }
}

#[derive(Default)]
pub struct MemoryBarberStore {
    barbers: RwLock<HashMap<String, Barber>>,
}

impl MemoryBarberStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BarberStore for MemoryBarberStore {
    async fn insert(&self, barber: &Barber) -> AppResult<()> {
        let mut barbers = self.barbers.write().await;
        if barbers.contains_key(&barber.id) {
            return Err(AppError::StorageError(format!("Duplicate barber id {}", barber.id)));
        }
        barbers.insert(barber.id.clone(), barber.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Barber>> {
        Ok(self.barbers.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Barber>> {
        let mut all: Vec<Barber> = self.barbers.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.chair_no.cmp(&b.chair_no).then_with(|| a.name.cmp(&b.name)));
        Ok(all)
    }

    async fn update(&self, barber: &Barber) -> AppResult<()> {
        match self.barbers.write().await.get_mut(&barber.id) {
            Some(stored) => {
                *stored = barber.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Barber {} not found", barber.id))),
        }
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.barbers.write().await.remove(id).is_some())
    }

    async fn find_by_status(&self, status: BarberStatus) -> AppResult<Vec<Barber>> {
        let all = self.find_all().await?;
        Ok(all.into_iter().filter(|b| b.status == status).collect())
    }

    async fn count_all(&self) -> AppResult<u64> {
        Ok(self.barbers.read().await.len() as u64)
    }

    async fn count_by_status(&self, status: BarberStatus) -> AppResult<u64> {
        let barbers = self.barbers.read().await;
        Ok(barbers.values().filter(|b| b.status == status).count() as u64)
    }
}
