//! Network input devices.
//!
//! [`NetworkInputDevice`] listens on a TCP or UDP socket and turns every
//! chunk it reads into a [`Frame`](portico_core::Frame). Reads are bounded by
//! a timeout so the cancellation signal raised by `on_stop` is observed
//! within one read timeout.

mod device;
mod reader;
mod transport;

pub use device::{
    DEFAULT_BUFFER_SIZE, DEFAULT_READ_TIMEOUT, NetworkInputDevice, ServeHandler, broadcast_handler,
};
pub use transport::Transport;
