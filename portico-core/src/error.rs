//! Error types for Portico.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`PorticoError`] - Top-level error type for all Portico operations
//! - [`AssemblyError`] - Configuration and registration errors (always fatal)
//! - [`TopicError`] - Malformed topic patterns
//! - [`DispatchError`] - Errors while routing a frame through the pipeline
//! - [`DeliveryError`] - Errors while commanding an output device
//! - [`TransportError`] - Network ingestion errors
//! - [`ConfigError`] - Errors reading configuration values

use std::io;
use thiserror::Error;

/// A boxed error type for component-supplied errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Portico operations.
#[derive(Error, Debug)]
pub enum PorticoError {
    /// The component graph could not be assembled.
    #[error("assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    /// A frame could not be dispatched.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// An output device could not be reached.
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// A network input device failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration could not be read.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Which device mapping already owns a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    /// The input device mapping.
    Input,
    /// The output device mapping.
    Output,
}

impl std::fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceRole::Input => f.write_str("input"),
            DeviceRole::Output => f.write_str("output"),
        }
    }
}

/// Configuration and registration errors.
///
/// Every variant is fatal: the component graph must not be used after one of
/// these is returned. Variants carry the configuration entry key that caused
/// them where one exists.
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// An encoder name was registered twice.
    #[error("encoder `{0}` is already registered")]
    DuplicateEncoder(String),

    /// A decoder name was registered twice.
    #[error("decoder `{0}` is already registered")]
    DuplicateDecoder(String),

    /// A device UUID is already used by another device.
    #[error("device uuid `{uuid}` is already registered as an {existing} device")]
    DuplicateUuid {
        /// The conflicting UUID.
        uuid: String,
        /// The mapping that already holds it.
        existing: DeviceRole,
    },

    /// No bundle factory is registered for the entry's type.
    #[error("entry `{entry}`: no factory registered for type `{type_name}`")]
    MissingFactory {
        /// The configuration entry key.
        entry: String,
        /// The resolved type name.
        type_name: String,
    },

    /// A codec factory produced neither an encoder nor a decoder.
    #[error("codec factory `{0}` produced neither an encoder nor a decoder")]
    UnknownCodec(String),

    /// A codec factory produced both an encoder and a decoder.
    #[error("codec factory `{0}` produced both an encoder and a decoder")]
    AmbiguousCodec(String),

    /// A configuration entry is not a table.
    #[error("entry `{entry}` must be a table")]
    MalformedEntry {
        /// The configuration entry key.
        entry: String,
    },

    /// A required field is missing or empty.
    #[error("entry `{entry}`: field `{field}` is required")]
    MissingField {
        /// The configuration entry key.
        entry: String,
        /// The missing field.
        field: &'static str,
    },

    /// The device address is incomplete.
    #[error("entry `{entry}`: fields `uuid`, `group` and `private` are all required")]
    InvalidAddress {
        /// The configuration entry key.
        entry: String,
    },

    /// The named encoder is not registered.
    #[error("entry `{entry}`: encoder `{name}` is not registered")]
    UnknownEncoder {
        /// The configuration entry key.
        entry: String,
        /// The encoder name.
        name: String,
    },

    /// The named decoder is not registered.
    #[error("entry `{entry}`: decoder `{name}` is not registered")]
    UnknownDecoder {
        /// The configuration entry key.
        entry: String,
        /// The decoder name.
        name: String,
    },

    /// The device has neither a configured nor a default codec.
    #[error("entry `{entry}`: `{role}` is required when the device has no default")]
    MissingCodec {
        /// The configuration entry key.
        entry: String,
        /// `encoder` or `decoder`.
        role: &'static str,
    },

    /// `topics` is missing, empty, or not an array of strings.
    #[error("entry `{entry}`: `topics` must be a non-empty array of strings")]
    InvalidTopics {
        /// The configuration entry key.
        entry: String,
    },

    /// A topic pattern failed to compile.
    #[error("entry `{entry}`: {source}")]
    InvalidPattern {
        /// The configuration entry key.
        entry: String,
        /// The compile error.
        #[source]
        source: TopicError,
    },

    /// A configuration value had the wrong type.
    #[error("entry `{entry}`: {source}")]
    Config {
        /// The configuration entry key.
        entry: String,
        /// The underlying config error.
        #[source]
        source: ConfigError,
    },

    /// The component's initialization hook failed.
    #[error("entry `{entry}`: initialization failed")]
    Init {
        /// The configuration entry key.
        entry: String,
        /// The hook error.
        #[source]
        source: BoxError,
    },
}

/// Errors produced when compiling a topic pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopicError {
    /// The pattern is empty.
    #[error("topic pattern is empty")]
    Empty,

    /// The multi-level wildcard appears before the final segment.
    #[error("topic pattern `{0}`: multi-level wildcard must be the final segment")]
    MisplacedMultiLevel(String),

    /// A wildcard token is embedded inside a longer segment.
    #[error("topic pattern `{pattern}`: segment `{segment}` mixes a wildcard with literal text")]
    MixedWildcard {
        /// The full pattern.
        pattern: String,
        /// The offending segment.
        segment: String,
    },
}

/// Errors that can occur while dispatching a frame.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The producer supplied an empty topic.
    #[error("topic must not be empty")]
    EmptyTopic,

    /// The source device is not a registered input device.
    #[error("no input device registered for uuid `{0}`")]
    UnknownDevice(String),

    /// The source device's decoder rejected the frame.
    #[error("decoder of device `{uuid}` failed")]
    Decode {
        /// The source device.
        uuid: String,
        /// The decoder error.
        #[source]
        source: BoxError,
    },

    /// An interceptor failed. This is distinct from an interceptor stopping
    /// the chain, which is reported as an outcome.
    #[error("interceptor `{name}` failed")]
    Interceptor {
        /// The interceptor's registered name.
        name: String,
        /// The interceptor error.
        #[source]
        source: BoxError,
    },
}

/// Errors that can occur when commanding an output device.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The target device is not a registered output device.
    #[error("no output device registered for uuid `{0}`")]
    UnknownDevice(String),

    /// The device's encoder rejected the packet.
    #[error("encoder of device `{uuid}` failed")]
    Encode {
        /// The target device.
        uuid: String,
        /// The encoder error.
        #[source]
        source: BoxError,
    },

    /// The device failed to process the frame.
    #[error("output device `{uuid}` failed")]
    Device {
        /// The target device.
        uuid: String,
        /// The device error.
        #[source]
        source: BoxError,
    },

    /// The device's decoder rejected the response frame.
    #[error("decoder of device `{uuid}` failed on the response")]
    Decode {
        /// The target device.
        uuid: String,
        /// The decoder error.
        #[source]
        source: BoxError,
    },
}

/// Errors produced by network input devices.
#[derive(Error, Debug)]
pub enum TransportError {
    /// No bind address was configured.
    #[error("network address is not set")]
    UnsetAddress,

    /// No transport type was configured.
    #[error("network transport is not set")]
    UnsetTransport,

    /// The transport type is not `tcp` or `udp`.
    #[error("unknown network transport `{0}`")]
    UnknownTransport(String),

    /// The default handler needs a topic and none was configured.
    #[error("the default serve handler requires a `topic`")]
    MissingTopic,

    /// `serve` was called before `on_start` installed a handler.
    #[error("no serve handler installed; call on_start first")]
    MissingHandler,

    /// Binding the socket failed.
    #[error("failed to bind {address}")]
    Bind {
        /// The configured address.
        address: String,
        /// The bind error.
        #[source]
        source: io::Error,
    },

    /// A non-transient socket error.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The serve handler rejected a frame.
    #[error("serve handler failed")]
    Handler(#[source] BoxError),
}

impl TransportError {
    /// Returns `true` when the error is a transient network condition worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Io(err) => is_transient(err),
            _ => false,
        }
    }
}

/// Classifies an I/O error as transient (timeout or temporary condition).
pub fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::Interrupted
            | io::ErrorKind::ConnectionAborted
    )
}

/// Errors produced when reading configuration values.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// The document root (or a section) is not a table.
    #[error("`{0}` must be a table")]
    NotATable(String),

    /// A value has the wrong type.
    #[error("`{key}` must be {expected}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// A description of the expected type.
        expected: &'static str,
    },
}

// Convenience conversions
impl From<BoxError> for PorticoError {
    fn from(err: BoxError) -> Self {
        PorticoError::Custom(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
