//! # portico - Event Routing for Device Gateways
//!
//! `portico` ingests raw frames from heterogeneous devices (card readers,
//! locks, sensors), classifies them by topic, runs them through a prioritized
//! interceptor chain and hands them to topic-matching drivers, which command
//! output devices through a call-scoped deliverer.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portico::prelude::*;
//! use std::sync::Arc;
//!
//! let mut builder = RegistrationBuilder::new();
//! builder.add_decoder("text", Arc::new(TextDecoder))?;
//! builder.add_bundle_factory("door", || Bundle::driver(DoorDriver));
//! builder.add_bundle_factory("udp-reader", || Bundle::input_device(NetworkInputDevice::udp()));
//! builder.assemble(&portico::config::from_toml_str(CONFIG)?, init_with_args)?;
//!
//! let registration = Arc::new(builder.build());
//! registration.log_summary();
//! let dispatcher = Arc::new(Dispatcher::new(registration.clone()));
//! ```
//!
//! The run loop (starting devices, calling `serve`, stopping) belongs to the
//! embedding application.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Core Traits
pub use portico_core::{
    Component, Decoder, Driver, Encoder, Initialize, InputDeliverer, InputDevice, Interceptor,
    OutputDeliverer, OutputDevice, Plugin, VirtualDevice,
};

// Dynamic Dispatch
pub use portico_core::{DynDriver, DynInputDevice, DynInterceptor, DynOutputDevice};

// Messages and Requests
pub use portico_core::{
    Attributes, Context, DriveRequest, DriveResult, Frame, InterceptOutcome, InterceptRequest,
    InterceptResult, Packet,
};

// Devices and Bundles
pub use portico_core::{Bundle, BundleKind, DeviceAddress, DeviceBase};

// Codecs
pub use portico_core::{CodecProvider, DecoderProvider, EncoderProvider, NopEncoder};

// Topics
pub use portico_core::{TopicExpr, TopicFilter, TopicSyntax};

// Configuration
pub use portico_core::Config;

// Errors
pub use portico_core::{
    AssemblyError, BoxError, BoxFuture, ConfigError, DeliveryError, DeviceRole, DispatchError,
    PorticoError, TopicError, TransportError, is_transient,
};

// Assembly
pub use portico_std::registration::{
    BundleFactory, DriverEntry, InterceptorEntry, LifecycleHook, LifecyclePhase, PluginEntry,
    Registration, RegistrationBuilder, SECTIONS, init_with_args,
};

// Dispatch
pub use portico_std::dispatch::{
    DispatchDeliverer, DispatchOutcome, DispatchReport, Dispatcher, DriverFailure, DriverReply,
    OutputRouter,
};

/// Network input devices.
pub mod network {
    pub use portico_std::network::{
        DEFAULT_BUFFER_SIZE, DEFAULT_READ_TIMEOUT, NetworkInputDevice, ServeHandler, Transport,
        broadcast_handler,
    };
}

/// Configuration document loaders.
pub mod config {
    pub use portico_std::config::{from_json_str, from_toml_str};
}

/// Standard interceptor implementations.
pub mod interceptors {
    pub use portico_std::interceptors::{LoggingInterceptor, TimeoutError, TimeoutInterceptor};
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use portico_std::testing::*;
}

/// Prelude module - common imports for Portico.
///
/// # Usage
///
/// ```rust,ignore
/// use portico::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Core Traits
        Component,
        Decoder,
        Driver,
        Encoder,
        Initialize,
        InputDeliverer,
        InputDevice,
        Interceptor,
        OutputDeliverer,
        OutputDevice,
        Plugin,
        VirtualDevice,
        // Messages
        Context,
        DriveRequest,
        DriveResult,
        Frame,
        InterceptRequest,
        InterceptResult,
        Packet,
        // Assembly and Dispatch
        Bundle,
        Config,
        DispatchOutcome,
        Dispatcher,
        RegistrationBuilder,
        TopicExpr,
        init_with_args,
        network::NetworkInputDevice,
        // Errors
        AssemblyError,
        BoxError,
    };
}
