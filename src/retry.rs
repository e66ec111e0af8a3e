use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;

use crate::config::RetryConfig;
use crate::utils::error::ProbeError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Same delay before every retry.
    #[default]
    Fixed,
    /// Delay grows with the attempt number: d, 2d, 3d, ...
    Linear,
}

/// Bounded retry for sites that intermittently block automated clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_secs(config.delay_secs)).with_backoff(config.backoff)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delays taken between attempts; one fewer than `max_attempts`.
    pub fn delays(&self) -> Vec<Duration> {
        let retries = (self.max_attempts - 1) as usize;
        match self.backoff {
            Backoff::Fixed => FixedInterval::new(self.delay).take(retries).collect(),
            Backoff::Linear => FixedInterval::new(self.delay)
                .take(retries)
                .zip(1u32..)
                .map(|(delay, n)| delay * n)
                .collect(),
        }
    }

    pub async fn run<T, F, Fut>(&self, label: &str, op: F) -> Result<T, ProbeError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ProbeError>>,
    {
        self.run_observed(label, op, |_, _| {}).await
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. `op` receives the 1-based attempt number and
    /// `on_delay` sees every wait before it happens.
    pub async fn run_observed<T, F, Fut, O>(&self, label: &str, mut op: F, mut on_delay: O) -> Result<T, ProbeError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ProbeError>>,
        O: FnMut(u32, Duration),
    {
        let max_attempts = self.max_attempts;
        let mut attempt = 0u32;

        let strategy = self.delays().into_iter().zip(1u32..).map(move |(delay, n)| {
            on_delay(n, delay);
            delay
        });

        let action = || {
            attempt += 1;
            if attempt > 1 {
                tracing::info!("{}: retry {}/{}", label, attempt, max_attempts);
            }
            op(attempt)
        };

        let condition = |error: &ProbeError| {
            if error.is_retryable() {
                tracing::warn!("{}: attempt failed, will retry if budget allows: {}", label, error);
                true
            } else {
                tracing::error!("{}: giving up, not retryable: {}", label, error);
                false
            }
        };

        let result = RetryIf::start(strategy, action, condition).await;
        if let Err(e) = &result {
            tracing::error!("{}: failed after retries: {}", label, e);
        }
        result
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}
