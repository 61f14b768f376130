// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate-limit retry policy shared by all AI provider backends.
//!
//! Only [`PersonaError::RateLimited`] is retried. Every other error is
//! returned immediately so callers fail fast on bad keys or malformed
//! requests.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::PersonaError;

/// Bounded exponential backoff for rate-limited provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Wait before the second attempt; doubles for each later attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Wait applied after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Runs `op` until it succeeds, fails with a non rate-limit error, or the
    /// attempt budget is exhausted.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, PersonaError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PersonaError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Err(PersonaError::RateLimited { message }) if attempt < max_attempts => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        provider = label,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %message,
                        "rate limited, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
