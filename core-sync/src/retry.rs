//! # Retry Policy
//!
//! Bounded retry with a fixed delay around a single fallible operation.
//!
//! Each invocation moves through `Attempting → {Success, Retrying, Fatal}`:
//! a failure the caller classifies as transient is retried after the fixed
//! delay while attempts remain; once `max_attempts` tries have been made the
//! last error is returned as [`RetryError::Exhausted`]. Failures that are not
//! transient are never retried and come back as [`RetryError::NonTransient`].
//!
//! ```ignore
//! let policy = RetryPolicy::new(3, Duration::from_secs(1))?;
//! let handle = policy
//!     .execute("upload a.jpg", BridgeError::is_transient, || {
//!         destination.upload(data.clone(), "a.jpg")
//!     })
//!     .await?;
//! ```

use core_runtime::config::RetrySettings;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::error::{Result, SyncError};

/// Terminal failure of a retried operation.
#[derive(Error, Debug)]
pub enum RetryError<E> {
    /// Every allowed attempt failed transiently
    #[error("gave up after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: E },

    /// A failure that retrying cannot fix
    #[error("non-retryable failure on attempt {attempt}: {error}")]
    NonTransient { attempt: u32, error: E },
}

impl<E> RetryError<E> {
    /// Number of calls made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            Self::NonTransient { attempt, .. } => *attempt,
        }
    }

    /// The last error observed
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::NonTransient { error, .. } => error,
        }
    }
}

/// Fixed-delay retry policy.
///
/// Policies are plain values; each call site may build its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Create a policy allowing at most `max_attempts` total tries.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] when `max_attempts` is zero.
    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(SyncError::Configuration(
                "Retry policy needs at least one attempt".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            delay,
        })
    }

    /// Create a policy from configuration
    pub fn from_settings(settings: &RetrySettings) -> Result<Self> {
        Self::new(settings.max_attempts, Duration::from_millis(settings.delay_ms))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `op` until it succeeds, fails non-transiently, or runs out of attempts.
    pub async fn execute<T, E, F, Fut, P>(
        &self,
        label: &str,
        is_transient: P,
        mut op: F,
    ) -> std::result::Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = %label, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if !is_transient(&err) => {
                    return Err(RetryError::NonTransient {
                        attempt,
                        error: err,
                    });
                }
                Err(err) if attempt >= self.max_attempts => {
                    error!(
                        operation = %label,
                        attempts = attempt,
                        error = %err,
                        "Retries exhausted"
                    );
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: err,
                    });
                }
                Err(err) => {
                    warn!(
                        operation = %label,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = self.delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}
