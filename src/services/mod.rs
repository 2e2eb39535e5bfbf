pub mod queue_manager;
pub mod resource_pool;

pub use queue_manager::{estimate_wait_minutes, QueueManager, AVERAGE_SERVICE_MINUTES};
pub use resource_pool::{Headcount, ResourcePool};
