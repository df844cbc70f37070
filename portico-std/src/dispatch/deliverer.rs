//! Device-facing entry point into the dispatcher.

use super::{DispatchOutcome, Dispatcher};
use portico_core::{BoxError, BoxFuture, Frame, InputDeliverer};
use std::sync::Arc;
use tracing::{trace, warn};

/// Feeds frames from one input device into a [`Dispatcher`].
///
/// Best effort: dispatch errors (decode, interceptor, unknown device) are
/// logged and never returned to the device.
#[derive(Clone)]
pub struct DispatchDeliverer {
    dispatcher: Arc<Dispatcher>,
    uuid: String,
}

impl DispatchDeliverer {
    /// A deliverer dispatching on behalf of the device `uuid`.
    pub fn new(dispatcher: Arc<Dispatcher>, uuid: impl Into<String>) -> Self {
        Self {
            dispatcher,
            uuid: uuid.into(),
        }
    }

    /// The source device.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }
}

impl InputDeliverer for DispatchDeliverer {
    fn broadcast<'a>(
        &'a self,
        topic: &'a str,
        frame: Frame,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(async move {
            match self.dispatcher.dispatch_frame(topic, &self.uuid, frame).await {
                Ok(DispatchOutcome::ShortCircuited { interceptor }) => {
                    trace!(topic, uuid = %self.uuid, interceptor = %interceptor, "frame dropped");
                }
                Ok(DispatchOutcome::Completed(_)) => {}
                Err(error) => {
                    warn!(topic, uuid = %self.uuid, %error, "dispatch failed");
                }
            }
            Ok(())
        })
    }
}
