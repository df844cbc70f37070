//! # Virtual devices
//!
//! A virtual device is the in-process stand-in for a physical device. Every
//! device carries a [`DeviceBase`] (name, address, codecs) that Registration
//! fills in exactly once during assembly, before the device is shared.
//!
//! - [`InputDevice`]s run a blocking [`serve`](InputDevice::serve) loop that
//!   pushes frames outward through an [`InputDeliverer`].
//! - [`OutputDevice`]s accept commands through
//!   [`process`](OutputDevice::process).
//!
//! # Static vs Dynamic Dispatch
//!
//! Both traits use native `async fn`. Registration stores devices as
//! [`DynInputDevice`] / [`DynOutputDevice`] trait objects; any implementor of
//! the static trait gets the dynamic one for free.

use crate::{
    address::DeviceAddress,
    codec::{Decoder, Encoder},
    component::{BoxFuture, Component},
    context::Context,
    deliverer::InputDeliverer,
    error::BoxError,
    message::Frame,
};
use std::{fmt, future::Future, sync::Arc};

/// Identity and codec bindings common to every device.
#[derive(Clone, Default)]
pub struct DeviceBase {
    name: String,
    address: DeviceAddress,
    topic: String,
    encoder: Option<Arc<dyn Encoder>>,
    decoder: Option<Arc<dyn Decoder>>,
}

impl DeviceBase {
    /// An unconfigured base with no default codecs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply a default encoder, used when configuration names none.
    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Supply a default decoder, used when configuration names none.
    pub fn with_decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// The configured device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configured address.
    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    /// The routing topic of an input device, or the topic pattern of an
    /// output device (empty when unset).
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The bound encoder.
    pub fn encoder(&self) -> Option<&Arc<dyn Encoder>> {
        self.encoder.as_ref()
    }

    /// The bound decoder.
    pub fn decoder(&self) -> Option<&Arc<dyn Decoder>> {
        self.decoder.as_ref()
    }

    /// Assembly only.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Assembly only.
    pub fn set_address(&mut self, address: DeviceAddress) {
        self.address = address;
    }

    /// Assembly only.
    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }

    /// Assembly only.
    pub fn set_encoder(&mut self, encoder: Arc<dyn Encoder>) {
        self.encoder = Some(encoder);
    }

    /// Assembly only.
    pub fn set_decoder(&mut self, decoder: Arc<dyn Decoder>) {
        self.decoder = Some(decoder);
    }
}

impl fmt::Debug for DeviceBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBase")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("topic", &self.topic)
            .field("encoder", &self.encoder.is_some())
            .field("decoder", &self.decoder.is_some())
            .finish()
    }
}

/// Capabilities shared by input and output devices.
pub trait VirtualDevice: Component {
    /// Identity and codec bindings.
    fn base(&self) -> &DeviceBase;

    /// Mutable access, used by Registration during assembly.
    fn base_mut(&mut self) -> &mut DeviceBase;

    /// Called by the run loop before the device is served.
    fn on_start(&self, _ctx: &Context) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called by the run loop on shutdown.
    fn on_stop(&self, _ctx: &Context) -> Result<(), BoxError> {
        Ok(())
    }
}

/// A device that produces frames.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `InputDevice`",
    label = "missing `InputDevice` implementation",
    note = "Input devices must implement `serve`."
)]
pub trait InputDevice: VirtualDevice {
    /// Run until stopped, pushing every received frame to `deliverer`.
    ///
    /// Returns `Ok(())` after a clean stop and an error when the device can no
    /// longer receive.
    fn serve(
        &self,
        deliverer: Arc<dyn InputDeliverer>,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Dynamic object-safe version of [`InputDevice`].
pub trait DynInputDevice: VirtualDevice {
    /// Dynamic dispatch version of [`InputDevice::serve`].
    fn serve_dyn<'a>(
        &'a self,
        deliverer: Arc<dyn InputDeliverer>,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

impl<T: InputDevice> DynInputDevice for T {
    fn serve_dyn<'a>(
        &'a self,
        deliverer: Arc<dyn InputDeliverer>,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.serve(deliverer))
    }
}

/// A device that accepts commands.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `OutputDevice`",
    label = "missing `OutputDevice` implementation",
    note = "Output devices must implement `process`."
)]
pub trait OutputDevice: VirtualDevice {
    /// Transmit one encoded command, optionally returning the device's reply.
    fn process(
        &self,
        frame: Frame,
        ctx: &Context,
    ) -> impl Future<Output = Result<Option<Frame>, BoxError>> + Send;
}

/// Dynamic object-safe version of [`OutputDevice`].
pub trait DynOutputDevice: VirtualDevice {
    /// Dynamic dispatch version of [`OutputDevice::process`].
    fn process_dyn<'a>(
        &'a self,
        frame: Frame,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<Option<Frame>, BoxError>>;
}

impl<T: OutputDevice> DynOutputDevice for T {
    fn process_dyn<'a>(
        &'a self,
        frame: Frame,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<Option<Frame>, BoxError>> {
        Box::pin(self.process(frame, ctx))
    }
}
