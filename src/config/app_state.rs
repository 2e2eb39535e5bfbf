use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{QueueManager, ResourcePool};
use crate::store::ShopStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Waiting line and claims
    pub queue: QueueManager,
    /// Barbers and their chairs
    pub barbers: ResourcePool,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wire both components onto the same store
    pub fn new(store: ShopStore, config: AppConfig) -> Self {
        let barbers = ResourcePool::new(store.clone());
        let queue = QueueManager::new(store, barbers.clone());

        Self {
            queue,
            barbers,
            config: Arc::new(config),
        }
    }
}
