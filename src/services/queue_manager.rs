use crate::dto::{EnqueueRequest, QueueEntryResponse, QueueStatsResponse};
use crate::interceptors::{AppError, AppResult};
use crate::models::{QueueEntry, QueueStatus};
use crate::services::resource_pool::{Headcount, ResourcePool};
use crate::store::{ShopStore, StoreGuard};
use crate::utils::{require_non_blank, validate_request};

/// Average minutes a barber spends per customer
pub const AVERAGE_SERVICE_MINUTES: u64 = 25;

/// Heuristic wait, in minutes, for a customer at `position`.
///
/// Zero when there are no barbers, or when the customer is first in line and a
/// chair is free. Otherwise `ceil(position / total * AVERAGE_SERVICE_MINUTES)`.
/// This is a rough guide for customers, not a promise.
pub fn estimate_wait_minutes(position: u32, headcount: Headcount) -> u32 {
    if headcount.total == 0 {
        return 0;
    }
    if headcount.available > 0 && position == 1 {
        return 0;
    }

    let scaled = u64::from(position) * AVERAGE_SERVICE_MINUTES;
    let minutes = scaled.div_ceil(headcount.total);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Owns the FIFO line of waiting customers and claims barbers for them.
///
/// Every read-modify-write runs under the store lock, so positions stay dense
/// (1..N, no duplicates) and a barber is never claimed twice.
#[derive(Clone)]
pub struct QueueManager {
    store: ShopStore,
    barbers: ResourcePool,
}

impl QueueManager {
    pub fn new(store: ShopStore, barbers: ResourcePool) -> Self {
        Self { store, barbers }
    }

    /// Add a customer to the back of the line
    pub async fn enqueue(&self, request: EnqueueRequest) -> AppResult<QueueEntry> {
        validate_request(&request)?;
        require_non_blank("customer_name", &request.customer_name)?;
        require_non_blank("service_type", &request.service_type)?;

        let _guard = self.store.lock().await;
        let waiting = self.store.entries().count_by_status(QueueStatus::Waiting).await?;

        let entry = QueueEntry::new(
            request.customer_name.trim().to_string(),
            request.service_type.trim().to_string(),
            position_from(waiting + 1)?,
        );
        self.store.entries().insert(&entry).await?;

        tracing::info!(
            "Customer {} joined the queue at position {} (entry {})",
            entry.customer_name,
            waiting + 1,
            entry.id
        );
        Ok(entry)
    }

    pub async fn get(&self, id: &str) -> AppResult<QueueEntry> {
        let guard = self.store.lock().await;
        self.find_locked(&guard, id).await
    }

    async fn find_locked(&self, _guard: &StoreGuard<'_>, id: &str) -> AppResult<QueueEntry> {
        self.store
            .entries()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Queue entry {} not found", id)))
    }

    /// Waiting customers in line order, each with its wait estimate
    pub async fn list_waiting(&self) -> AppResult<Vec<QueueEntryResponse>> {
        let guard = self.store.lock().await;
        let waiting = self.store.entries().find_by_status(QueueStatus::Waiting).await?;
        let headcount = self.barbers.headcount_locked(&guard).await?;

        Ok(waiting
            .into_iter()
            .map(|entry| {
                let estimate = entry.position.map(|p| estimate_wait_minutes(p, headcount));
                QueueEntryResponse {
                    entry,
                    estimated_wait_minutes: estimate,
                }
            })
            .collect())
    }

    /// Delete an entry whatever its status, then close the gap in the line.
    ///
    /// Returns `None` when the id is unknown. Removing an entry that is in
    /// service frees its barber if the barber still points at it. On failure
    /// the entry, the line and the barber are put back as they were.
    pub async fn remove(&self, id: &str) -> AppResult<Option<QueueEntry>> {
        let guard = self.store.lock().await;

        let Some(entry) = self.store.entries().find_by_id(id).await? else {
            tracing::debug!("Queue entry {} already gone", id);
            return Ok(None);
        };
        let waiting = self.store.entries().find_by_status(QueueStatus::Waiting).await?;

        let serving_barber = match (entry.status, entry.barber_id.as_deref()) {
            (QueueStatus::InProgress, Some(barber_id)) => {
                if self.release_for_entry(&guard, barber_id, &entry.id).await? {
                    Some(barber_id)
                } else {
                    None
                }
            }
            _ => None,
        };

        let result = async {
            self.store.entries().delete(&entry.id).await?;
            self.renumber_locked(&guard, &without(&waiting, &entry.id)).await
        }
        .await;

        if let Err(e) = result {
            self.restore_removed(&guard, &entry).await;
            self.restore_entries(&guard, &waiting).await;
            if let Some(barber_id) = serving_barber {
                self.restore_reservation(&guard, barber_id, &entry.id).await;
            }
            return Err(e);
        }

        tracing::info!("Queue entry {} removed", entry.id);
        Ok(Some(entry))
    }

    /// Claim the first waiting customer for `barber_id`
    pub async fn call_next(&self, barber_id: &str) -> AppResult<QueueEntry> {
        let guard = self.store.lock().await;

        let waiting = self.store.entries().find_by_status(QueueStatus::Waiting).await?;
        let Some(first) = waiting.first() else {
            return Err(AppError::EmptyQueue);
        };

        // Fails without writing anything if the barber is unknown or busy.
        self.barbers.reserve_locked(&guard, barber_id, &first.id).await?;

        let mut claimed = first.clone();
        claimed.mark_in_progress(barber_id);

        let result = async {
            self.store.entries().update(&claimed).await?;
            self.renumber_locked(&guard, &waiting[1..]).await
        }
        .await;

        if let Err(e) = result {
            self.restore_entries(&guard, &waiting).await;
            self.undo_reservation(&guard, barber_id, &claimed.id).await;
            return Err(e);
        }

        tracing::info!(
            "Barber {} called {} (entry {})",
            barber_id,
            claimed.customer_name,
            claimed.id
        );
        Ok(claimed)
    }

    /// Mark an entry done and free its barber
    pub async fn complete(&self, id: &str) -> AppResult<QueueEntry> {
        let guard = self.store.lock().await;

        let previous = self.find_locked(&guard, id).await?;
        if previous.status == QueueStatus::Done {
            return Ok(previous);
        }
        let waiting = if previous.is_waiting() {
            self.store.entries().find_by_status(QueueStatus::Waiting).await?
        } else {
            Vec::new()
        };

        let mut entry = previous.clone();
        entry.mark_done();
        self.store.entries().update(&entry).await?;

        let released_barber = match entry.barber_id.as_deref() {
            Some(barber_id) => match self.release_for_entry(&guard, barber_id, &entry.id).await {
                Ok(true) => Some(barber_id),
                Ok(false) => None,
                Err(e) => {
                    self.restore_entries(&guard, std::slice::from_ref(&previous)).await;
                    return Err(e);
                }
            },
            None => None,
        };

        if let Err(e) = self.renumber_locked(&guard, &without(&waiting, &entry.id)).await {
            self.restore_entries(&guard, &waiting).await;
            self.restore_entries(&guard, std::slice::from_ref(&previous)).await;
            if let Some(barber_id) = released_barber {
                self.restore_reservation(&guard, barber_id, &entry.id).await;
            }
            return Err(e);
        }

        tracing::info!("Service completed for entry {}", entry.id);
        Ok(entry)
    }

    /// Number of waiting customers
    pub async fn queue_size(&self) -> AppResult<u64> {
        let _guard = self.store.lock().await;
        self.store.entries().count_by_status(QueueStatus::Waiting).await
    }

    /// Heuristic wait in minutes for a 1-based position, see [`estimate_wait_minutes`]
    pub async fn estimate_wait(&self, position: u32) -> AppResult<u32> {
        if position == 0 {
            return Err(AppError::ValidationError("position must be at least 1".to_string()));
        }

        let guard = self.store.lock().await;
        let headcount = self.barbers.headcount_locked(&guard).await?;
        Ok(estimate_wait_minutes(position, headcount))
    }

    /// Queue size and the wait a newly joining customer would face
    pub async fn stats(&self) -> AppResult<QueueStatsResponse> {
        let guard = self.store.lock().await;
        let queue_size = self.store.entries().count_by_status(QueueStatus::Waiting).await?;
        let headcount = self.barbers.headcount_locked(&guard).await?;

        Ok(QueueStatsResponse {
            queue_size,
            estimated_wait_time: estimate_wait_minutes(position_from(queue_size + 1)?, headcount),
        })
    }

    /// Release a barber after its entry left service. Returns whether the
    /// barber was actually freed. A barber that has since been deleted is
    /// only logged.
    async fn release_for_entry(
        &self,
        guard: &StoreGuard<'_>,
        barber_id: &str,
        entry_id: &str,
    ) -> AppResult<bool> {
        match self.barbers.release_locked(guard, barber_id, Some(entry_id)).await {
            Ok((_, freed)) => Ok(freed),
            Err(AppError::NotFound(_)) => {
                tracing::warn!("Entry {} references missing barber {}", entry_id, barber_id);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Give positions 1..N to `line`, which must already be in line order
    async fn renumber_locked(&self, _guard: &StoreGuard<'_>, line: &[QueueEntry]) -> AppResult<()> {
        for (index, entry) in line.iter().enumerate() {
            let position = position_from(index as u64 + 1)?;
            if entry.position != Some(position) {
                let mut moved = entry.clone();
                moved.position = Some(position);
                self.store.entries().update(&moved).await?;
            }
        }
        Ok(())
    }

    /// Write entries back to an earlier snapshot. Failures are logged and skipped.
    async fn restore_entries(&self, _guard: &StoreGuard<'_>, snapshot: &[QueueEntry]) {
        for entry in snapshot {
            if let Err(e) = self.store.entries().update(entry).await {
                tracing::error!("Failed to restore queue entry {}: {}", entry.id, e);
            }
        }
    }

    /// Put back an entry whose deletion has to be undone
    async fn restore_removed(&self, _guard: &StoreGuard<'_>, entry: &QueueEntry) {
        let restored = match self.store.entries().find_by_id(&entry.id).await {
            Ok(Some(_)) => self.store.entries().update(entry).await,
            Ok(None) => self.store.entries().insert(entry).await,
            Err(e) => Err(e),
        };
        if let Err(e) = restored {
            tracing::error!("Failed to restore removed queue entry {}: {}", entry.id, e);
        }
    }

    /// Hand a released barber back to the entry it was serving
    async fn restore_reservation(&self, guard: &StoreGuard<'_>, barber_id: &str, entry_id: &str) {
        if let Err(e) = self.barbers.reserve_locked(guard, barber_id, entry_id).await {
            tracing::error!("Failed to give barber {} back to entry {}: {}", barber_id, entry_id, e);
        }
    }

    /// Free a barber reserved by a claim that did not go through
    async fn undo_reservation(&self, guard: &StoreGuard<'_>, barber_id: &str, entry_id: &str) {
        if let Err(e) = self.barbers.release_locked(guard, barber_id, Some(entry_id)).await {
            tracing::error!("Failed to release barber {} after failed claim: {}", barber_id, e);
        }
    }
}

/// Snapshot of the line minus one entry
fn without(line: &[QueueEntry], id: &str) -> Vec<QueueEntry> {
    line.iter().filter(|e| e.id != id).cloned().collect()
}

fn position_from(value: u64) -> AppResult<u32> {
    u32::try_from(value).map_err(|_| AppError::InternalError("queue position overflow".to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::dto::CreateBarberRequest;
    use crate::models::{Barber, BarberStatus};
    use crate::store::{
        BarberStore, MemoryBarberStore, MemoryQueueEntryStore, MockBarberStore,
        MockQueueEntryStore, QueueEntryStore,
    };

    fn shop() -> (QueueManager, ResourcePool) {
        let store = ShopStore::in_memory();
        let barbers = ResourcePool::new(store.clone());
        (QueueManager::new(store, barbers.clone()), barbers)
    }

    fn customer(name: &str) -> EnqueueRequest {
        EnqueueRequest {
            customer_name: name.to_string(),
            service_type: "Haircut".to_string(),
        }
    }

    async fn add_barber(barbers: &ResourcePool, name: &str, chair_no: i32) -> Barber {
        barbers
            .create(CreateBarberRequest {
                name: name.to_string(),
                phone: None,
                chair_no,
            })
            .await
            .unwrap()
    }

    async fn waiting_positions(queue: &QueueManager) -> Vec<(String, u32)> {
        queue
            .list_waiting()
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.entry.customer_name, r.entry.position.unwrap()))
            .collect()
    }

    #[test]
    fn test_estimate_wait_minutes() {
        let none = Headcount { total: 0, available: 0 };
        let one_free = Headcount { total: 1, available: 1 };
        let two_busy = Headcount { total: 2, available: 0 };
        let three_one_free = Headcount { total: 3, available: 1 };

        assert_eq!(estimate_wait_minutes(5, none), 0);
        assert_eq!(estimate_wait_minutes(1, one_free), 0);
        assert_eq!(estimate_wait_minutes(2, one_free), 50);
        assert_eq!(estimate_wait_minutes(1, two_busy), 13);
        assert_eq!(estimate_wait_minutes(3, two_busy), 38);
        assert_eq!(estimate_wait_minutes(2, three_one_free), 17);
    }

    #[tokio::test]
    async fn test_enqueue_assigns_positions_in_join_order() {
        let (queue, _) = shop();
        for name in ["Alice", "Bob", "Carol", "Dan"] {
            queue.enqueue(customer(name)).await.unwrap();
        }

        assert_eq!(
            waiting_positions(&queue).await,
            vec![
                ("Alice".to_string(), 1),
                ("Bob".to_string(), 2),
                ("Carol".to_string(), 3),
                ("Dan".to_string(), 4),
            ]
        );
        assert_eq!(queue.queue_size().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_enqueue_rejects_blank_names() {
        let (queue, _) = shop();
        assert!(matches!(
            queue.enqueue(customer("  ")).await,
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(queue.queue_size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remove_closes_the_gap() {
        let (queue, _) = shop();
        queue.enqueue(customer("Alice")).await.unwrap();
        let bob = queue.enqueue(customer("Bob")).await.unwrap();
        queue.enqueue(customer("Carol")).await.unwrap();

        let removed = queue.remove(&bob.id).await.unwrap();
        assert_eq!(removed.map(|e| e.id), Some(bob.id.clone()));
        assert_eq!(queue.queue_size().await.unwrap(), 2);
        assert_eq!(
            waiting_positions(&queue).await,
            vec![("Alice".to_string(), 1), ("Carol".to_string(), 2)]
        );

        assert!(queue.remove(&bob.id).await.unwrap().is_none());
        assert!(matches!(queue.get(&bob.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_in_service_entry_frees_barber() {
        let (queue, barbers) = shop();
        let chair = add_barber(&barbers, "Mike", 1).await;
        let alice = queue.enqueue(customer("Alice")).await.unwrap();
        queue.call_next(&chair.id).await.unwrap();

        queue.remove(&alice.id).await.unwrap();

        let chair = barbers.get(&chair.id).await.unwrap();
        assert_eq!(chair.status, BarberStatus::Available);
        assert_eq!(chair.current_entry_id, None);
    }

    #[tokio::test]
    async fn test_call_next_on_empty_queue() {
        let (queue, barbers) = shop();
        let chair = add_barber(&barbers, "Mike", 1).await;

        assert!(matches!(queue.call_next(&chair.id).await, Err(AppError::EmptyQueue)));
        assert!(barbers.get(&chair.id).await.unwrap().is_available());
    }

    #[tokio::test]
    async fn test_call_next_with_busy_barber_leaves_queue_unchanged() {
        let (queue, barbers) = shop();
        let chair = add_barber(&barbers, "Mike", 1).await;
        queue.enqueue(customer("Alice")).await.unwrap();
        queue.enqueue(customer("Bob")).await.unwrap();
        barbers.set_status(&chair.id, BarberStatus::Busy).await.unwrap();

        assert!(matches!(
            queue.call_next(&chair.id).await,
            Err(AppError::ResourceUnavailable(_))
        ));
        assert!(matches!(
            queue.call_next("no-such-barber").await,
            Err(AppError::ResourceUnavailable(_))
        ));

        assert_eq!(queue.queue_size().await.unwrap(), 2);
        assert_eq!(
            waiting_positions(&queue).await,
            vec![("Alice".to_string(), 1), ("Bob".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_call_next_claims_entry_and_barber() {
        let (queue, barbers) = shop();
        let chair = add_barber(&barbers, "Mike", 1).await;
        let alice = queue.enqueue(customer("Alice")).await.unwrap();

        let claimed = queue.call_next(&chair.id).await.unwrap();
        assert_eq!(claimed.id, alice.id);
        assert_eq!(claimed.status, QueueStatus::InProgress);
        assert_eq!(claimed.barber_id.as_deref(), Some(chair.id.as_str()));
        assert_eq!(queue.get(&alice.id).await.unwrap(), claimed);

        let chair = barbers.get(&chair.id).await.unwrap();
        assert_eq!(chair.status, BarberStatus::Busy);
        assert_eq!(chair.current_entry_id.as_deref(), Some(alice.id.as_str()));
        assert_eq!(queue.queue_size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_alice_and_bob_walk_in() {
        let (queue, barbers) = shop();
        let chair1 = add_barber(&barbers, "Mike", 1).await;

        let alice = queue.enqueue(customer("Alice")).await.unwrap();
        let bob = queue.enqueue(customer("Bob")).await.unwrap();
        assert_eq!(alice.position, Some(1));
        assert_eq!(bob.position, Some(2));

        let claimed = queue.call_next(&chair1.id).await.unwrap();
        assert_eq!(claimed.id, alice.id);
        assert_eq!(queue.get(&bob.id).await.unwrap().position, Some(1));

        let done = queue.complete(&alice.id).await.unwrap();
        assert_eq!(done.status, QueueStatus::Done);
        let chair1 = barbers.get(&chair1.id).await.unwrap();
        assert_eq!(chair1.status, BarberStatus::Available);
        assert_eq!(chair1.current_entry_id, None);

        assert_eq!(queue.estimate_wait(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_estimate_wait_without_barbers_is_zero() {
        let (queue, _) = shop();
        for position in [1, 2, 10] {
            assert_eq!(queue.estimate_wait(position).await.unwrap(), 0);
        }
        assert!(matches!(
            queue.estimate_wait(0).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_estimate_next_arrival() {
        let (queue, barbers) = shop();
        let chair1 = add_barber(&barbers, "Mike", 1).await;
        add_barber(&barbers, "Sarah", 2).await;
        for name in ["Alice", "Bob", "Carol"] {
            queue.enqueue(customer(name)).await.unwrap();
        }
        queue.call_next(&chair1.id).await.unwrap();

        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.queue_size, 2);
        assert_eq!(stats.estimated_wait_time, 38);
    }

    #[tokio::test]
    async fn test_complete_unknown_entry() {
        let (queue, _) = shop();
        assert!(matches!(queue.complete("missing").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_complete_waiting_entry_renumbers() {
        let (queue, _) = shop();
        let alice = queue.enqueue(customer("Alice")).await.unwrap();
        queue.enqueue(customer("Bob")).await.unwrap();

        let done = queue.complete(&alice.id).await.unwrap();
        assert_eq!(done.position, None);
        assert_eq!(waiting_positions(&queue).await, vec![("Bob".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_complete_twice_does_not_free_next_customer() {
        let (queue, barbers) = shop();
        let chair = add_barber(&barbers, "Mike", 1).await;
        let alice = queue.enqueue(customer("Alice")).await.unwrap();
        let bob = queue.enqueue(customer("Bob")).await.unwrap();

        queue.call_next(&chair.id).await.unwrap();
        queue.complete(&alice.id).await.unwrap();
        queue.call_next(&chair.id).await.unwrap();

        let again = queue.complete(&alice.id).await.unwrap();
        assert_eq!(again.status, QueueStatus::Done);
        let chair = barbers.get(&chair.id).await.unwrap();
        assert_eq!(chair.current_entry_id.as_deref(), Some(bob.id.as_str()));
    }

    #[tokio::test]
    async fn test_complete_with_deleted_barber_still_succeeds() {
        let (queue, barbers) = shop();
        let chair = add_barber(&barbers, "Mike", 1).await;
        let alice = queue.enqueue(customer("Alice")).await.unwrap();
        queue.call_next(&chair.id).await.unwrap();
        barbers.delete(&chair.id).await.unwrap();

        let done = queue.complete(&alice.id).await.unwrap();
        assert_eq!(done.status, QueueStatus::Done);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enqueues_get_unique_positions() {
        let (queue, _) = shop();

        let handles: Vec<_> = (0..25)
            .map(|i| {
                let queue = queue.clone();
                tokio::spawn(async move { queue.enqueue(customer(&format!("Customer {}", i))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let positions: Vec<u32> = waiting_positions(&queue).await.into_iter().map(|(_, p)| p).collect();
        assert_eq!(positions, (1..=25).collect::<Vec<u32>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_call_next_claims_barber_once() {
        let (queue, barbers) = shop();
        let chair = add_barber(&barbers, "Mike", 1).await;
        for i in 0..10 {
            queue.enqueue(customer(&format!("Customer {}", i))).await.unwrap();
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                let barber_id = chair.id.clone();
                tokio::spawn(async move { queue.call_next(&barber_id).await })
            })
            .collect();

        let mut claimed = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(entry) => claimed.push(entry),
                Err(e) => assert!(matches!(e, AppError::ResourceUnavailable(_))),
            }
        }

        assert_eq!(claimed.len(), 1);
        assert_eq!(queue.queue_size().await.unwrap(), 9);
        let positions: HashSet<u32> = waiting_positions(&queue).await.into_iter().map(|(_, p)| p).collect();
        assert_eq!(positions, (1..=9).collect::<HashSet<u32>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_call_next_with_many_barbers() {
        let (queue, barbers) = shop();
        let mut chairs = Vec::new();
        for chair_no in 1..=4 {
            chairs.push(add_barber(&barbers, &format!("Barber {}", chair_no), chair_no).await);
        }
        for i in 0..6 {
            queue.enqueue(customer(&format!("Customer {}", i))).await.unwrap();
        }

        let handles: Vec<_> = chairs
            .iter()
            .map(|chair| {
                let queue = queue.clone();
                let barber_id = chair.id.clone();
                tokio::spawn(async move { queue.call_next(&barber_id).await })
            })
            .collect();

        let mut served = HashSet::new();
        for handle in handles {
            let entry = handle.await.unwrap().unwrap();
            assert!(served.insert(entry.id));
        }

        assert_eq!(served.len(), 4);
        assert!(barbers.list_available().await.unwrap().is_empty());
        assert_eq!(
            waiting_positions(&queue).await.into_iter().map(|(_, p)| p).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn test_failed_reserve_write_leaves_queue_unchanged() {
        let chair = Barber::new("Mike".to_string(), None, 1);
        let lookup = chair.clone();

        let mut barber_store = MockBarberStore::new();
        barber_store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(lookup.clone())));
        barber_store
            .expect_update()
            .returning(|_| Err(AppError::StorageError("disk full".to_string())));

        let store = ShopStore::new(Arc::new(MemoryQueueEntryStore::new()), Arc::new(barber_store));
        let queue = QueueManager::new(store.clone(), ResourcePool::new(store));
        let alice = queue.enqueue(customer("Alice")).await.unwrap();

        assert!(matches!(
            queue.call_next(&chair.id).await,
            Err(AppError::StorageError(_))
        ));

        let alice = queue.get(&alice.id).await.unwrap();
        assert_eq!(alice.status, QueueStatus::Waiting);
        assert_eq!(alice.position, Some(1));
        assert_eq!(alice.barber_id, None);
    }

    fn storage_error() -> AppError {
        AppError::StorageError("connection reset".to_string())
    }

    /// Alice in a chair with Mike, both sides pointing at each other
    fn alice_with_mike() -> (QueueEntry, Barber) {
        let mut mike = Barber::new("Mike".to_string(), None, 1);
        let mut alice = QueueEntry::new("Alice".to_string(), "Haircut".to_string(), 1);
        alice.mark_in_progress(&mike.id);
        mike.assign(&alice.id);
        (alice, mike)
    }

    /// Entry updates fail on call number `fail_on`; the others are recorded
    fn record_updates(
        entries: &mut MockQueueEntryStore,
        fail_on: usize,
    ) -> Arc<Mutex<Vec<QueueEntry>>> {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let recorded = writes.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        entries.expect_update().returning(move |entry| {
            if calls.fetch_add(1, Ordering::SeqCst) == fail_on {
                return Err(storage_error());
            }
            recorded.lock().unwrap().push(entry.clone());
            Ok(())
        });
        writes
    }

    fn last_write(writes: &Mutex<Vec<QueueEntry>>, id: &str) -> QueueEntry {
        writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|e| e.id == id)
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_remove_keeps_entry_when_barber_release_fails() {
        let (alice, mike) = alice_with_mike();
        let entries = Arc::new(MemoryQueueEntryStore::new());
        entries.insert(&alice).await.unwrap();

        let mut barber_store = MockBarberStore::new();
        let lookup = mike.clone();
        barber_store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(lookup.clone())));
        barber_store.expect_update().returning(|_| Err(storage_error()));

        let store = ShopStore::new(entries.clone(), Arc::new(barber_store));
        let queue = QueueManager::new(store.clone(), ResourcePool::new(store));

        assert!(matches!(queue.remove(&alice.id).await, Err(AppError::StorageError(_))));

        let kept = entries.find_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(kept.status, QueueStatus::InProgress);
        assert_eq!(kept.barber_id.as_deref(), Some(mike.id.as_str()));
    }

    #[tokio::test]
    async fn test_remove_gives_barber_back_when_delete_fails() {
        let (alice, mike) = alice_with_mike();
        let barbers = Arc::new(MemoryBarberStore::new());
        barbers.insert(&mike).await.unwrap();

        let mut entry_store = MockQueueEntryStore::new();
        let lookup = alice.clone();
        entry_store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(lookup.clone())));
        entry_store.expect_find_by_status().returning(|_| Ok(Vec::new()));
        entry_store.expect_delete().returning(|_| Err(storage_error()));
        let writes = record_updates(&mut entry_store, usize::MAX);

        let store = ShopStore::new(Arc::new(entry_store), barbers.clone());
        let queue = QueueManager::new(store.clone(), ResourcePool::new(store));

        assert!(matches!(queue.remove(&alice.id).await, Err(AppError::StorageError(_))));

        let mike = barbers.find_by_id(&mike.id).await.unwrap().unwrap();
        assert_eq!(mike.status, BarberStatus::Busy);
        assert_eq!(mike.current_entry_id.as_deref(), Some(alice.id.as_str()));
        assert_eq!(last_write(&writes, &alice.id), alice);
    }

    #[tokio::test]
    async fn test_complete_restores_entry_when_barber_release_fails() {
        let (alice, mike) = alice_with_mike();
        let entries = Arc::new(MemoryQueueEntryStore::new());
        entries.insert(&alice).await.unwrap();

        let mut barber_store = MockBarberStore::new();
        let lookup = mike.clone();
        barber_store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(lookup.clone())));
        barber_store.expect_update().returning(|_| Err(storage_error()));

        let store = ShopStore::new(entries.clone(), Arc::new(barber_store));
        let queue = QueueManager::new(store.clone(), ResourcePool::new(store));

        assert!(matches!(queue.complete(&alice.id).await, Err(AppError::StorageError(_))));

        let restored = entries.find_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(restored, alice);
    }

    #[tokio::test]
    async fn test_call_next_rolls_back_when_renumbering_fails() {
        let line: Vec<QueueEntry> = ["Alice", "Bob", "Carol"]
            .iter()
            .zip(1..)
            .map(|(name, position)| QueueEntry::new(name.to_string(), "Haircut".to_string(), position))
            .collect();

        let mut entry_store = MockQueueEntryStore::new();
        let snapshot = line.clone();
        entry_store
            .expect_find_by_status()
            .returning(move |_| Ok(snapshot.clone()));
        // Call 0 claims Alice, call 1 moves Bob up.
        let writes = record_updates(&mut entry_store, 1);

        let store = ShopStore::new(Arc::new(entry_store), Arc::new(MemoryBarberStore::new()));
        let barbers = ResourcePool::new(store.clone());
        let queue = QueueManager::new(store, barbers.clone());
        let mike = add_barber(&barbers, "Mike", 1).await;

        assert!(matches!(queue.call_next(&mike.id).await, Err(AppError::StorageError(_))));

        let mike = barbers.get(&mike.id).await.unwrap();
        assert_eq!(mike.status, BarberStatus::Available);
        assert_eq!(mike.current_entry_id, None);

        for original in &line {
            let written = last_write(&writes, &original.id);
            assert_eq!(written.status, QueueStatus::Waiting);
            assert_eq!(written.position, original.position);
            assert_eq!(written.barber_id, None);
        }
    }

    #[tokio::test]
    async fn test_complete_rolls_back_when_renumbering_fails() {
        let alice = QueueEntry::new("Alice".to_string(), "Haircut".to_string(), 1);
        let bob = QueueEntry::new("Bob".to_string(), "Shave".to_string(), 2);

        let mut entry_store = MockQueueEntryStore::new();
        let lookup = alice.clone();
        entry_store
            .expect_find_by_id()
            .returning(move |_| Ok(Some(lookup.clone())));
        let snapshot = vec![alice.clone(), bob.clone()];
        entry_store
            .expect_find_by_status()
            .returning(move |_| Ok(snapshot.clone()));
        // Call 0 marks Alice done, call 1 moves Bob up.
        let writes = record_updates(&mut entry_store, 1);

        let store = ShopStore::new(Arc::new(entry_store), Arc::new(MemoryBarberStore::new()));
        let queue = QueueManager::new(store.clone(), ResourcePool::new(store));

        assert!(matches!(queue.complete(&alice.id).await, Err(AppError::StorageError(_))));

        assert_eq!(last_write(&writes, &alice.id), alice);
        assert_eq!(last_write(&writes, &bob.id), bob);
    }
}
