use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::config::AppState;
use crate::handlers::{
    call_next, complete_entry, create_barber, delete_barber, enqueue, finish_service, get_barber,
    get_entry, health_check, list_available_barbers, list_barbers, list_queue, queue_stats,
    remove_entry, update_barber, update_barber_status,
};

/// Create API router
pub fn create_router(state: AppState) -> Router {
    // Health check route (outside /api)
    let health_routes = Router::new()
        .route("/health", get(health_check));

    let barber_routes = Router::new()
        .route("/barbers", get(list_barbers).post(create_barber))
        .route("/barbers/available", get(list_available_barbers))
        .route(
            "/barbers/:id",
            get(get_barber).put(update_barber).delete(delete_barber),
        )
        .route("/barbers/:id/status", patch(update_barber_status))
        .route("/barbers/:id/finish-service", post(finish_service));

    let queue_routes = Router::new()
        .route("/queue", get(list_queue).post(enqueue))
        .route("/queue/stats", get(queue_stats))
        .route("/queue/call-next", post(call_next))
        .route("/queue/:id", get(get_entry).delete(remove_entry))
        .route("/queue/:id/complete", post(complete_entry));

    Router::new()
        .merge(health_routes)
        .nest("/api", Router::new()
            .merge(barber_routes)
            .merge(queue_routes)
        )
        .with_state(state)
}
