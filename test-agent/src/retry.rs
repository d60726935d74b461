use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use thiserror::Error;
use tokio::time::sleep;

/// Outcome of a single probe invocation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Attempt {
    Succeeded,
    Failed,
}

impl From<bool> for Attempt {
    fn from(succeeded: bool) -> Self {
        if succeeded {
            Self::Succeeded
        } else {
            Self::Failed
        }
    }
}

/// A repeatable observation. Closures returning a future implement it; stateful
/// probes can implement it directly.
pub trait Probe {
    type Error;

    fn attempt(&mut self) -> impl Future<Output = Result<Attempt, Self::Error>>;
}

impl<F, Fut, E> Probe for F
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt, E>>,
{
    type Error = E;

    fn attempt(&mut self) -> impl Future<Output = Result<Attempt, E>> {
        self()
    }
}

#[serde_as]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "initial_delay_ms")]
    pub initial_delay: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "retry_delay_ms")]
    pub retry_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, initial_delay: Duration, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            retry_delay,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{label} (gave up after {attempts} attempts)")]
pub struct RetryTimeout {
    label: &'static str,
    attempts: u32,
}

impl RetryTimeout {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error(transparent)]
    Timeout(RetryTimeout),
    /// The probe itself failed; the error is passed through untouched.
    #[error(transparent)]
    Probe(E),
}

/// Runs `probe` until it succeeds or `policy.max_attempts` invocations have
/// failed. Waits `initial_delay` before the first attempt and `retry_delay`
/// between failed attempts. A zero attempt budget times out immediately.
pub async fn retry<P>(
    policy: &RetryPolicy,
    label: &'static str,
    probe: &mut P,
) -> Result<(), RetryError<P::Error>>
where
    P: Probe,
{
    let timeout = RetryTimeout {
        label,
        attempts: policy.max_attempts,
    };
    if policy.max_attempts == 0 {
        return Err(RetryError::Timeout(timeout));
    }

    sleep(policy.initial_delay).await;
    for attempt in 1..=policy.max_attempts {
        match probe.attempt().await.map_err(RetryError::Probe)? {
            Attempt::Succeeded => {
                tracing::debug!(label, attempt, "probe succeeded");
                return Ok(());
            }
            Attempt::Failed => {
                tracing::debug!(
                    label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    "probe failed"
                );
                if attempt < policy.max_attempts {
                    sleep(policy.retry_delay).await;
                }
            }
        }
    }

    Err(RetryError::Timeout(timeout))
}
