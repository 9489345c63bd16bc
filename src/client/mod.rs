mod retry;

pub use retry::{Backoff, FixedBackoff, RandomExponential, RetryPolicy, Sleeper};

use crate::error::{AnnotateError, Result};
use crate::vendor::{AnnotationService, BatchRequest, VepRecord};
use tracing::{debug, warn};

/// Wraps an [`AnnotationService`] with a bounded retry policy.
pub struct RetryingAnnotationClient<S> {
    service: S,
    policy: RetryPolicy,
}

impl<S: AnnotationService> RetryingAnnotationClient<S> {
    pub fn new(service: S, policy: RetryPolicy) -> Self {
        Self { service, policy }
    }

    /// Send one batch request. Retryable failures are retried until the
    /// policy's attempt budget is spent; anything else is returned at once.
    pub fn call(&self, request: &BatchRequest) -> Result<Vec<VepRecord>> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            match self.service.annotate(request) {
                Ok(records) => {
                    if attempt > 1 {
                        debug!(attempt, "annotation request succeeded after retry");
                    }
                    return Ok(records);
                }
                Err(err) if !self.policy.is_retryable(&err) => {
                    return Err(AnnotateError::Service(err));
                }
                Err(err) if attempt >= max_attempts => {
                    return Err(AnnotateError::RetriesExhausted {
                        attempts: attempt,
                        source: err,
                    });
                }
                Err(err) => {
                    warn!(attempt, max_attempts, error = %err, "annotation request failed, retrying");
                    let delay = self.policy.pause(attempt);
                    debug!(?delay, "backed off");
                    attempt += 1;
                }
            }
        }
    }
}
