/*!
 * Bounded reconnect-and-retry around a single engine round trip.
 *
 * Any error from the operation triggers a reconnect and another attempt. After
 * the last attempt the policy gives up without reconnecting and reports
 * `RetryOutcome::Exhausted`, which callers can tell apart from an empty result.
 */

use std::future::Future;
use std::time::Duration;

use log::{error, warn};

use super::connection::{ConnectionManager, Handle};
use crate::app_config::RetryConfig;
use crate::errors::ConnectionError;

/// Result of running an operation under a [`RetryPolicy`]
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T> {
    /// One of the attempts succeeded
    Completed(T),
    /// Every attempt failed
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// Error of the final attempt
        last_error: ConnectionError,
    },
}

impl<T> RetryOutcome<T> {
    /// The value of a completed run
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Exhausted { .. } => None,
        }
    }
}

/// How many times an operation is attempted and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Create a policy; at least one attempt is always made
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Create a policy from the retry configuration
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.delay_ms))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `operation` against the current handle, reconnecting between failed attempts
    ///
    /// # Arguments
    /// * `connections` - Manager owning the handle
    /// * `operation` - Performs exactly one round trip on the handle it is given
    pub async fn run<T, F, Fut>(&self, connections: &ConnectionManager, mut operation: F) -> RetryOutcome<T>
    where
        F: FnMut(Handle) -> Fut,
        Fut: Future<Output = Result<T, ConnectionError>>,
    {
        let mut last_error = ConnectionError::NotConnected;

        for attempt in 1..=self.max_attempts {
            // A missing handle counts as a failed attempt on generation 0
            let (generation, result) = match connections.current_handle() {
                Ok(handle) => (handle.generation(), operation(handle).await),
                Err(e) => (0, Err(e)),
            };

            match result {
                Ok(value) => return RetryOutcome::Completed(value),
                Err(e) => {
                    warn!(
                        "Query failed on generation {}: {} - attempt {}/{}",
                        generation, e, attempt, self.max_attempts
                    );
                    last_error = e;
                }
            }

            if attempt == self.max_attempts {
                break;
            }

            if let Err(e) = connections.reconnect_after(generation).await {
                error!("Reconnect after attempt {} failed: {}", attempt, e);
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            warn!(
                "Retrying query {} time{}",
                attempt,
                if attempt > 1 { "s" } else { "" }
            );
        }

        error!(
            "Giving up after {} attempts: {}",
            self.max_attempts, last_error
        );
        RetryOutcome::Exhausted {
            attempts: self.max_attempts,
            last_error,
        }
    }
}
