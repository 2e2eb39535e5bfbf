use anyhow::Context;
use barbershop_queue::config::{AppConfig, AppState, DatabaseConfig};
use barbershop_queue::middleware::setup_logging;
use barbershop_queue::routes::create_router;
use barbershop_queue::utils::seed_demo_data;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup logging
    setup_logging();

    tracing::info!("Starting application...");

    // Load configurations
    let app_config = AppConfig::from_env().context("failed to load app config")?;
    let db_config = DatabaseConfig::from_env().context("failed to load database config")?;

    tracing::info!("Loaded configuration for environment: {}", app_config.environment);

    // Shared store for the queue and the barbers
    let store = db_config.create_store().await.context("failed to create store")?;

    let app_state = AppState::new(store, app_config.clone());

    if app_config.seed_demo_data {
        seed_demo_data(&app_state).await.context("failed to seed demo data")?;
    }

    // Create router
    let app = create_router(app_state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = app_config.server_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        "{} v{} is running on {}",
        app_config.app_name,
        app_config.app_version,
        addr
    );

    axum::serve(listener, app).await?;

    Ok(())
}
