use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// Retry settings for transient storage failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Exponential backoff before the given retry (0-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_delay * 2_u32.saturating_pow(retry)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, sqlx::Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let mut retries = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if is_transient(&err) && retries + 1 < self.max_attempts => {
                    let delay = self.backoff(retries);
                    retries += 1;
                    tracing::warn!(
                        "Transient storage error in {} (attempt {}/{}), retrying in {:?}: {}",
                        operation,
                        retries,
                        self.max_attempts,
                        delay,
                        err
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Errors worth another attempt: connection trouble, pool exhaustion,
/// serialization failures and deadlocks.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}
