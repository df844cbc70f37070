//! Call-scoped delivery capabilities.
//!
//! A deliverer is handed to a component for the duration of one call and is
//! never stored. Components reach the rest of the system only through it.
//!
//! - [`InputDeliverer`] is given to [`InputDevice::serve`] and forwards raw
//!   frames into the dispatch pipeline.
//! - [`OutputDeliverer`] is given to [`Driver::drive`] and addresses output
//!   devices by topic or UUID.
//!
//! Both are object-safe so they can be passed as `&dyn` / `Arc<dyn>`.
//!
//! [`InputDevice::serve`]: crate::InputDevice::serve
//! [`Driver::drive`]: crate::Driver::drive

use crate::{
    component::BoxFuture,
    error::{BoxError, DeliveryError},
    message::{Frame, Packet},
};

/// Forwards frames produced by an input device.
pub trait InputDeliverer: Send + Sync {
    /// Route `frame` under `topic`.
    fn broadcast<'a>(&'a self, topic: &'a str, frame: Frame) -> BoxFuture<'a, Result<(), BoxError>>;
}

/// Addresses output devices on behalf of a driver.
pub trait OutputDeliverer: Send + Sync {
    /// Send `packet` to every output device whose topic pattern matches
    /// `topic`.
    ///
    /// Best effort: failures are logged, never returned. Yields the number of
    /// devices that accepted the packet.
    fn broadcast<'a>(&'a self, topic: &'a str, packet: Packet) -> BoxFuture<'a, usize>;

    /// Send `packet` to the output device registered under `uuid` and return
    /// its decoded reply, if any.
    fn deliver<'a>(
        &'a self,
        uuid: &'a str,
        packet: Packet,
    ) -> BoxFuture<'a, Result<Option<Packet>, DeliveryError>>;
}
