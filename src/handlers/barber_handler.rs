use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::config::AppState;
use crate::dto::{CreateBarberRequest, StatusQuery, UpdateBarberRequest};
use crate::interceptors::{ApiSuccess, AppError};
use crate::models::Barber;

pub async fn list_barbers(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<Barber>>, AppError> {
    let barbers = state.barbers.list_all().await?;

    Ok(ApiSuccess::new("Barbers retrieved successfully", barbers))
}

pub async fn list_available_barbers(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<Barber>>, AppError> {
    let barbers = state.barbers.list_available().await?;

    Ok(ApiSuccess::new("Available barbers retrieved successfully", barbers))
}

pub async fn create_barber(
    State(state): State<AppState>,
    Json(request): Json<CreateBarberRequest>,
) -> Result<ApiSuccess<Barber>, AppError> {
    let barber = state.barbers.create(request).await?;

    Ok(ApiSuccess::created("Barber created successfully", barber))
}

pub async fn get_barber(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<Barber>, AppError> {
    let barber = state.barbers.get(&id).await?;

    Ok(ApiSuccess::new("Barber retrieved successfully", barber))
}

pub async fn update_barber(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBarberRequest>,
) -> Result<ApiSuccess<Barber>, AppError> {
    let barber = state.barbers.update(&id, request).await?;

    Ok(ApiSuccess::new("Barber updated successfully", barber))
}

pub async fn delete_barber(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<()>, AppError> {
    state.barbers.delete(&id).await?;

    Ok(ApiSuccess::<()>::new_without_data("Barber deleted successfully"))
}

pub async fn update_barber_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<ApiSuccess<Barber>, AppError> {
    let barber = state.barbers.set_status(&id, query.status).await?;

    Ok(ApiSuccess::new("Barber status updated successfully", barber))
}

/// Free a barber's chair without touching the queue entry
pub async fn finish_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<Barber>, AppError> {
    let barber = state.barbers.release(&id).await?;

    Ok(ApiSuccess::new("Barber is available", barber))
}
