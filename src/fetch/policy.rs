use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

/// Retry/timeout knobs for one logical fetch. Immutable once built.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,
}

fn default_max_retries() -> u32 { 3 }
fn default_initial_backoff_ms() -> u64 { 300 }
fn default_max_backoff_ms() -> u64 { 10_000 }
fn default_timeout_ms() -> u64 { 10_000 }
fn default_jitter_max_ms() -> u64 { 100 }

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            timeout_ms: default_timeout_ms(),
            jitter_max_ms: default_jitter_max_ms(),
        }
    }
}

impl RetryPolicy {
    /// Same timeout, no retries. Used for non-idempotent requests.
    pub fn single_attempt(&self) -> Self {
        Self {
            max_retries: 0,
            ..self.clone()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Deterministic part of the delay before retry `attempt` (0-based):
    /// `min(initial * 2^attempt, max)`.
    pub fn base_delay_ms(&self, attempt: u32) -> u64 {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        self.initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms)
    }

    /// Full delay before retry `attempt`, jitter drawn from `[0, jitter_max_ms)`.
    pub fn backoff_delay<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let jitter = if self.jitter_max_ms == 0 {
            0
        } else {
            rng.gen_range(0..self.jitter_max_ms)
        };
        Duration::from_millis(self.base_delay_ms(attempt) + jitter)
    }
}
