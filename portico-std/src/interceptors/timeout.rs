//! Timeout interceptor for time-limited execution.

use portico_core::{Component, Initialize, InterceptOutcome, InterceptRequest, Interceptor};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Error returned when an interceptor times out.
#[derive(Error, Debug, Clone)]
#[error("interceptor timed out after {0:?}")]
pub struct TimeoutError(pub Duration);

/// Wraps another interceptor with a deadline.
///
/// An interceptor that misses its deadline fails the dispatch; it does not
/// short-circuit it.
pub struct TimeoutInterceptor<I> {
    inner: I,
    duration: Duration,
}

impl<I> TimeoutInterceptor<I> {
    /// Create a new timeout interceptor.
    pub fn new(inner: I, duration: Duration) -> Self {
        Self { inner, duration }
    }
}

impl<I: Interceptor> Component for TimeoutInterceptor<I> {
    fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    fn as_initialize(&mut self) -> Option<&mut dyn Initialize> {
        self.inner.as_initialize()
    }
}

impl<I: Interceptor> Interceptor for TimeoutInterceptor<I> {
    async fn intercept(&self, request: InterceptRequest<'_>) -> InterceptOutcome {
        match timeout(self.duration, self.inner.intercept(request)).await {
            Ok(result) => result,
            Err(_) => Err(TimeoutError(self.duration).into()),
        }
    }

    fn topic_filtered(&self) -> bool {
        self.inner.topic_filtered()
    }
}
