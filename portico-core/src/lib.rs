//! # portico-core
//!
//! Core traits and value types for the Portico device event-routing core.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! device, codec and driver crates that don't need the full `portico-std`
//! implementation.
//!
//! # Pipeline
//!
//! ```text
//! InputDevice::serve ─▶ Frame ─▶ Decoder ─▶ Packet ─▶ Interceptors ─▶ Drivers
//!                                                        (priority)     (topic)
//!                                                                          │
//!                        OutputDevice::process ◀─ Frame ◀─ Encoder ◀─ OutputDeliverer
//! ```
//!
//! ## Devices ([`InputDevice`], [`OutputDevice`])
//!
//! Virtual stand-ins for physical hardware. Input devices push frames through
//! an [`InputDeliverer`]; output devices accept encoded commands.
//!
//! ## Codecs ([`Encoder`], [`Decoder`])
//!
//! Pure translation between [`Frame`]s and [`Packet`]s, looked up by name.
//!
//! ## Interceptors ([`Interceptor`])
//!
//! Prioritized hooks that run before drivers, may enrich [`Attributes`] and
//! may stop a dispatch.
//!
//! ## Drivers ([`Driver`])
//!
//! Business logic selected by [`TopicExpr`] matching. Drivers reach output
//! devices only through the call-scoped [`OutputDeliverer`].
//!
//! # Error Types
//!
//! - [`PorticoError`] - Top-level error type
//! - [`AssemblyError`] - Fatal configuration errors
//! - [`DispatchError`] / [`DeliveryError`] - Routing errors
//! - [`TransportError`] - Network ingestion errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod address;
mod bundle;
mod codec;
mod component;
mod config;
mod context;
mod deliverer;
mod device;
mod driver;
mod error;
mod interceptor;
mod message;
mod plugin;
mod topic;

// Re-exports
pub use address::DeviceAddress;
pub use bundle::{Bundle, BundleKind};
pub use codec::{CodecProvider, Decoder, DecoderProvider, Encoder, EncoderProvider, NopEncoder};
pub use component::{BoxFuture, Component, Initialize};
pub use config::Config;
pub use context::Context;
pub use deliverer::{InputDeliverer, OutputDeliverer};
pub use device::{
    DeviceBase, DynInputDevice, DynOutputDevice, InputDevice, OutputDevice, VirtualDevice,
};
pub use driver::{DriveRequest, DriveResult, Driver, DynDriver};
pub use error::{
    AssemblyError, BoxError, ConfigError, DeliveryError, DeviceRole, DispatchError, PorticoError,
    TopicError, TransportError, is_transient,
};
pub use interceptor::{
    DynInterceptor, InterceptOutcome, InterceptRequest, InterceptResult, Interceptor,
};
pub use message::{Attributes, Frame, Packet};
pub use plugin::Plugin;
pub use topic::{TopicExpr, TopicFilter, TopicSyntax};
