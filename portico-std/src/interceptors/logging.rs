//! Logging interceptor for dispatch observation.

use portico_core::{Component, InterceptOutcome, InterceptRequest, InterceptResult, Interceptor};
use tracing::info;

/// An interceptor that logs every dispatch and always continues.
///
/// It sees every topic and never needs `topics` in configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

impl Component for LoggingInterceptor {}

impl Interceptor for LoggingInterceptor {
    async fn intercept(&self, request: InterceptRequest<'_>) -> InterceptOutcome {
        info!(
            topic = request.topic,
            uuid = request.uuid,
            packet = ?request.packet.fields(),
            "dispatching"
        );
        Ok(InterceptResult::Next)
    }

    fn topic_filtered(&self) -> bool {
        false
    }
}
