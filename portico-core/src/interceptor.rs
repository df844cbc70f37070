//! # Interceptors
//!
//! Interceptors run before any driver, in ascending priority order (lower
//! first, registration order on ties). They may enrich the dispatch
//! [`Attributes`] or stop the dispatch altogether by returning
//! [`InterceptResult::Stop`].
//!
//! Stopping is an outcome, not an error: an interceptor that fails returns
//! `Err` instead, and the dispatcher reports the two differently.

use crate::{
    component::{BoxFuture, Component},
    context::Context,
    error::BoxError,
    message::{Attributes, Packet},
};
use std::future::Future;

/// Whether the dispatch continues past an interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptResult {
    /// Continue with the next interceptor, then the drivers.
    Next,
    /// Short-circuit: no further interceptor or driver runs.
    Stop,
}

/// The result of one intercept call.
pub type InterceptOutcome = Result<InterceptResult, BoxError>;

/// Everything an interceptor sees for one dispatch.
pub struct InterceptRequest<'a> {
    /// Mutable dispatch attributes, visible to later interceptors and drivers.
    pub attrs: &'a mut Attributes,
    /// The routing topic.
    pub topic: &'a str,
    /// UUID of the source input device.
    pub uuid: &'a str,
    /// The decoded packet.
    pub packet: &'a Packet,
    /// Engine context.
    pub ctx: &'a Context,
}

/// A prioritized pre-dispatch hook.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `Interceptor`",
    label = "missing `Interceptor` implementation",
    note = "Interceptors must implement `intercept`."
)]
pub trait Interceptor: Component {
    /// Inspect a dispatch before drivers run.
    fn intercept(
        &self,
        request: InterceptRequest<'_>,
    ) -> impl Future<Output = InterceptOutcome> + Send;

    /// Whether Registration must attach a topic filter from `topics`.
    fn topic_filtered(&self) -> bool {
        true
    }
}

/// Dynamic object-safe version of [`Interceptor`].
pub trait DynInterceptor: Component {
    /// Dynamic dispatch version of [`Interceptor::intercept`].
    fn intercept_dyn<'a>(
        &'a self,
        request: InterceptRequest<'a>,
    ) -> BoxFuture<'a, InterceptOutcome>;

    /// Forwards [`Interceptor::topic_filtered`].
    fn filters_topics(&self) -> bool;
}

impl<T: Interceptor> DynInterceptor for T {
    fn intercept_dyn<'a>(
        &'a self,
        request: InterceptRequest<'a>,
    ) -> BoxFuture<'a, InterceptOutcome> {
        Box::pin(self.intercept(request))
    }

    fn filters_topics(&self) -> bool {
        self.topic_filtered()
    }
}
