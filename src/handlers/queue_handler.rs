use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::config::AppState;
use crate::dto::{CallNextQuery, EnqueueRequest, QueueEntryResponse, QueueStatsResponse};
use crate::interceptors::{ApiSuccess, AppError};
use crate::models::QueueEntry;

/// Waiting customers with their estimated waits
pub async fn list_queue(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<QueueEntryResponse>>, AppError> {
    let entries = state.queue.list_waiting().await?;

    Ok(ApiSuccess::new("Queue retrieved successfully", entries))
}

/// Join the queue
pub async fn enqueue(
    State(state): State<AppState>,
    Json(request): Json<EnqueueRequest>,
) -> Result<ApiSuccess<QueueEntryResponse>, AppError> {
    let entry = state.queue.enqueue(request).await?;
    let estimate = match entry.position {
        Some(position) => Some(state.queue.estimate_wait(position).await?),
        None => None,
    };

    Ok(ApiSuccess::created(
        "Added to queue successfully",
        QueueEntryResponse {
            entry,
            estimated_wait_minutes: estimate,
        },
    ))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<QueueEntry>, AppError> {
    let entry = state.queue.get(&id).await?;

    Ok(ApiSuccess::new("Queue entry retrieved successfully", entry))
}

/// Leave the queue; unknown ids succeed too
pub async fn remove_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<()>, AppError> {
    let message = match state.queue.remove(&id).await? {
        Some(_) => "Removed from queue successfully",
        None => "Queue entry was already removed",
    };

    Ok(ApiSuccess::<()>::new_without_data(message))
}

/// Claim the next waiting customer for a barber
pub async fn call_next(
    State(state): State<AppState>,
    Query(query): Query<CallNextQuery>,
) -> Result<ApiSuccess<QueueEntry>, AppError> {
    let entry = state.queue.call_next(&query.barber_id).await?;

    Ok(ApiSuccess::new("Next customer called", entry))
}

pub async fn complete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<QueueEntry>, AppError> {
    let entry = state.queue.complete(&id).await?;

    Ok(ApiSuccess::new("Service completed", entry))
}

pub async fn queue_stats(
    State(state): State<AppState>,
) -> Result<ApiSuccess<QueueStatsResponse>, AppError> {
    let stats = state.queue.stats().await?;

    Ok(ApiSuccess::new("Queue stats retrieved successfully", stats))
}
