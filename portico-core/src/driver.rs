//! # Drivers
//!
//! Drivers hold the business logic of a gateway. The dispatcher invokes every
//! driver whose topic filter matches, in registration order, each with the
//! same decoded packet. A driver may command output devices through the
//! request's [`OutputDeliverer`] and may return a reply packet.
//!
//! A driver's name and topic filter are not part of the trait: Registration
//! attaches them from configuration.

use crate::{
    component::{BoxFuture, Component},
    context::Context,
    deliverer::OutputDeliverer,
    error::BoxError,
    message::{Attributes, Packet},
};
use std::future::Future;

/// The result of one drive call.
pub type DriveResult = Result<Option<Packet>, BoxError>;

/// Everything a driver sees for one dispatch.
///
/// Attributes are read-only here; only interceptors may write them.
#[derive(Clone, Copy)]
pub struct DriveRequest<'a> {
    /// Attributes accumulated by the interceptor chain.
    pub attrs: &'a Attributes,
    /// The routing topic.
    pub topic: &'a str,
    /// UUID of the source input device.
    pub uuid: &'a str,
    /// The decoded packet, shared by every driver of this dispatch.
    pub packet: &'a Packet,
    /// Access to output devices, valid for this call only.
    pub deliverer: &'a dyn OutputDeliverer,
    /// Engine context.
    pub ctx: &'a Context,
}

/// Topic-routed business logic.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Driver`",
    label = "missing `Driver` implementation",
    note = "Drivers must implement `drive`."
)]
pub trait Driver: Component {
    /// Handle one dispatched packet.
    fn drive(&self, request: DriveRequest<'_>) -> impl Future<Output = DriveResult> + Send;

    /// Whether Registration must attach a topic filter from `topics`.
    ///
    /// Drivers returning `false` receive every topic.
    fn topic_filtered(&self) -> bool {
        true
    }
}

/// Dynamic object-safe version of [`Driver`].
pub trait DynDriver: Component {
    /// Dynamic dispatch version of [`Driver::drive`].
    fn drive_dyn<'a>(&'a self, request: DriveRequest<'a>) -> BoxFuture<'a, DriveResult>;

    /// Forwards [`Driver::topic_filtered`].
    fn filters_topics(&self) -> bool;
}

impl<T: Driver> DynDriver for T {
    fn drive_dyn<'a>(&'a self, request: DriveRequest<'a>) -> BoxFuture<'a, DriveResult> {
        Box::pin(self.drive(request))
    }

    fn filters_topics(&self) -> bool {
        self.topic_filtered()
    }
}
