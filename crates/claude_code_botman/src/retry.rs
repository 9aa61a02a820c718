//! Opt-in retry with fixed or exponential backoff.
//!
//! The client never retries on its own; wrap calls explicitly:
//!
//! ```no_run
//! # async fn demo(client: &claude_code_botman::ClaudeCode) -> Result<(), claude_code_botman::ClaudeCodeError> {
//! use claude_code_botman::retry::{retry_if, RetryPolicy};
//!
//! let response = retry_if(
//!     &RetryPolicy::exponential(3),
//!     |err: &claude_code_botman::ClaudeCodeError| err.is_retryable(),
//!     move || client.call("Summarize the README"),
//! )
//! .await?;
//! # drop(response);
//! # Ok(())
//! # }
//! ```

use std::{fmt::Display, future::Future, time::Duration};

use tracing::warn;

/// Cap for exponential delays.
pub const MAX_DELAY: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    Exponential,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero behaves like one.
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn exponential(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Pause before attempt `attempt + 1`, where `attempt` counts from 1.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let factor = 1u32 << attempt.saturating_sub(1).min(16);
                self.delay.saturating_mul(factor).min(MAX_DELAY)
            }
        }
    }
}

/// Retries `op` on every error.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    retry_if(policy, |_: &E| true, op).await
}

/// Retries `op` while `should_retry` accepts the error and attempts remain.
pub async fn retry_if<T, E, P, F, Fut>(
    policy: &RetryPolicy,
    mut should_retry: P,
    mut op: F,
) -> Result<T, E>
where
    P: FnMut(&E) -> bool,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && should_retry(&err) => {
                let delay = policy.delay_for(attempt);
                warn!(attempt, max_attempts, ?delay, error = %err, "retrying after failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
