use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::QueueEntry;

/// Join the queue
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueRequest {
    #[validate(length(min = 1, max = 100, message = "Customer name must be between 1 and 100 characters"))]
    pub customer_name: String,

    #[validate(length(min = 1, max = 100, message = "Service type must be between 1 and 100 characters"))]
    pub service_type: String,
}

/// Queue entry plus its current wait estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntryResponse {
    #[serde(flatten)]
    pub entry: QueueEntry,
    /// Heuristic, only present while the entry is waiting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_wait_minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatsResponse {
    pub queue_size: u64,
    /// Estimated wait in minutes for someone joining now
    pub estimated_wait_time: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallNextQuery {
    pub barber_id: String,
}
