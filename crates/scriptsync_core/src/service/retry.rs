//! Retry wrapper for transient service failures.

use std::future::Future;
use std::time::Duration;

use super::ServiceError;

/// Retries an operation on transient failures with linear backoff.
///
/// Attempt `n` (1-based) sleeps `base_backoff * n` before the next try,
/// so waits grow 5s, 10s, 15s with the default 5s base. Non-transient
/// errors are returned to the caller unchanged on the first occurrence.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
        }
    }

    /// Run `op`, retrying while it fails transiently. `description`
    /// names the operation in logs and in the final error.
    pub async fn execute<T, F, Fut>(&self, description: &str, mut op: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    let backoff = self.base_backoff * attempt;
                    tracing::warn!(
                        operation = description,
                        attempt,
                        max_attempts = self.max_attempts,
                        backoff_secs = backoff.as_secs_f64(),
                        error = %err,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) if err.is_transient() => {
                    return Err(ServiceError::ExhaustedRetries {
                        description: description.to_string(),
                        attempts: self.max_attempts,
                        source: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }
}
