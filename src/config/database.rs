use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::interceptors::{AppError, AppResult};
use crate::store::{PgBarberStore, PgQueueEntryStore, RetryPolicy, ShopStore};

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Postgres URL; the in-memory store is used when unset
    pub url: Option<String>,
    pub max_connections: u32,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        let url = cfg.get_string("DATABASE_URL").ok();

        Ok(Self {
            url: if url.as_ref().map_or(false, |u| !u.is_empty()) { url } else { None },
            max_connections: cfg.get_int("DATABASE_MAX_CONNECTIONS").unwrap_or(10) as u32,
            retry_attempts: cfg.get_int("STORE_RETRY_ATTEMPTS").unwrap_or(3) as u32,
            retry_backoff_ms: cfg.get_int("STORE_RETRY_BACKOFF_MS").unwrap_or(50) as u64,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_backoff_ms))
    }

    pub async fn create_pool(&self, url: &str) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
    }

    /// Build the shared store: Postgres when a URL is configured, in-memory otherwise
    pub async fn create_store(&self) -> AppResult<ShopStore> {
        let Some(url) = self.url.as_deref() else {
            tracing::warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
            return Ok(ShopStore::in_memory());
        };

        let pool = self.create_pool(url).await?;
        tracing::info!("Database connection pool created");

        run_migrations(&pool)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to run migrations: {}", e)))?;
        tracing::info!("Database migrations applied");

        let retry = self.retry_policy();
        Ok(ShopStore::new(
            Arc::new(PgQueueEntryStore::new(pool.clone(), retry)),
            Arc::new(PgBarberStore::new(pool, retry)),
        ))
    }
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
}
