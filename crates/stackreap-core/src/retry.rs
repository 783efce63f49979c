//! Exponential backoff around a deletion task
//!
//! The task runs first; if it is not done and steps remain, the loop sleeps
//! for the current delay and multiplies it by the factor. A factor of 0 or 1
//! keeps the delay constant. An `Err` from the task ends the loop at once.

use crate::error::{DestroyError, Result};
use crate::task::Completion;
use backon::{BackoffBuilder, ExponentialBuilder};
use stackreap_config::RetrySettings;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub factor: f64,
    /// Maximum number of invocations.
    pub max_steps: u32,
}

impl RetryPolicy {
    pub fn new(initial_delay: Duration, factor: f64, max_steps: u32) -> Self {
        Self {
            initial_delay,
            factor,
            max_steps,
        }
    }

    /// Sleeps between invocations, one fewer than `max_steps`.
    fn delays(&self) -> impl Iterator<Item = Duration> {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .without_max_delay()
            .with_factor(self.factor.max(1.0) as f32)
            .with_max_times(self.max_steps.saturating_sub(1) as usize)
            .build()
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            initial_delay: Duration::from_secs_f64(settings.initial_delay_secs.max(0.0)),
            factor: settings.factor,
            max_steps: settings.steps,
        }
    }
}

/// Invokes `attempt` until it reports [`Completion::Done`].
///
/// Returns the number of invocations used. Running out of steps yields
/// [`DestroyError::Timeout`] carrying whatever the last attempt reported as left.
pub async fn retry<F, Fut>(task: &str, policy: &RetryPolicy, mut attempt: F) -> Result<u32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Completion>>,
{
    let mut delays = policy.delays();
    let mut remaining = Vec::new();
    let mut attempts = 0;

    while attempts < policy.max_steps {
        attempts += 1;

        match attempt().await {
            Ok(Completion::Done) => {
                debug!(task, attempts, "Task completed");
                return Ok(attempts);
            }
            Ok(Completion::Pending(left)) => {
                remaining = left;
                if attempts < policy.max_steps {
                    let delay = delays.next().unwrap_or(policy.initial_delay);
                    debug!(
                        task,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Task not done yet, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => {
                error!(task, attempts, error = %e, "Task failed");
                return Err(e);
            }
        }
    }

    Err(DestroyError::Timeout {
        task: task.to_string(),
        attempts,
        remaining,
    })
}
