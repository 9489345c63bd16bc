use crate::config::RetryConfig;
use crate::vendor::ServiceError;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Delay to wait before the `retry`-th retry (1-based).
pub trait Backoff: Send + Sync {
    fn delay(&self, retry: u32) -> Duration;
}

/// Full-jitter exponential backoff: a uniform draw from
/// `[0, min(max, multiplier * 2^(retry - 1))]`.
#[derive(Debug, Clone, Copy)]
pub struct RandomExponential {
    pub multiplier: Duration,
    pub max: Duration,
}

impl RandomExponential {
    pub fn upper_bound(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(31);
        self.multiplier.saturating_mul(factor).min(self.max)
    }
}

impl Backoff for RandomExponential {
    fn delay(&self, retry: u32) -> Duration {
        let upper = self.upper_bound(retry);
        if upper.is_zero() {
            return Duration::ZERO;
        }
        let drawn = rand::rng().random_range(0.0..=upper.as_secs_f64());
        Duration::try_from_secs_f64(drawn)
            .unwrap_or(upper)
            .min(upper)
    }
}

/// Constant delay between attempts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedBackoff(pub Duration);

impl Backoff for FixedBackoff {
    fn delay(&self, _retry: u32) -> Duration {
        self.0
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

/// How many times to try, how long to wait in between, and which failures
/// are worth another attempt.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Arc<dyn Backoff>,
    sleeper: Sleeper,
    retryable: fn(&ServiceError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: impl Backoff + 'static) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Arc::new(backoff),
            sleeper: Arc::new(std::thread::sleep),
            retryable: ServiceError::is_retryable,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        let backoff = RandomExponential {
            multiplier: secs(config.backoff_multiplier_secs),
            max: secs(config.max_backoff_secs),
        };
        Self::new(config.max_attempts, backoff)
    }

    /// Replace the function used to wait between attempts.
    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn with_retryable(mut self, retryable: fn(&ServiceError) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub(crate) fn is_retryable(&self, err: &ServiceError) -> bool {
        (self.retryable)(err)
    }

    /// Wait before retry number `retry`; returns the delay that was used.
    pub(crate) fn pause(&self, retry: u32) -> Duration {
        let delay = self.backoff.delay(retry);
        (self.sleeper)(delay);
        delay
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}
