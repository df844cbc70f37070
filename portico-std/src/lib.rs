//! # portico-std
//!
//! Standard implementations for the Portico device event-routing core.
//!
//! This crate provides:
//! - **Assembly**: [`RegistrationBuilder`](registration::RegistrationBuilder),
//!   [`Registration`](registration::Registration)
//! - **Dispatch**: [`Dispatcher`](dispatch::Dispatcher) and its deliverers
//! - **Network ingestion**: [`NetworkInputDevice`](network::NetworkInputDevice)
//! - **Standard interceptors**: Logging, Timeout
//! - **Configuration loaders**: TOML and JSON

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use portico_core;

// Modules
pub mod config;
pub mod dispatch;
pub mod interceptors;
pub mod network;
pub mod registration;
pub mod testing;
