//! Frame ↔ packet translation.
//!
//! Concrete codecs are supplied by the embedding application and looked up by
//! name. Both directions are pure functions: no I/O, no shared mutable state.

use crate::{
    error::BoxError,
    message::{Frame, Packet},
};
use std::sync::Arc;

/// Turns a packet into the bytes a device understands.
pub trait Encoder: Send + Sync + 'static {
    /// Encode one packet.
    fn encode(&self, packet: Packet) -> Result<Frame, BoxError>;
}

/// Turns device bytes into a packet.
pub trait Decoder: Send + Sync + 'static {
    /// Decode one frame.
    fn decode(&self, frame: Frame) -> Result<Packet, BoxError>;
}

/// An encoder for receive-only devices: every packet encodes to an empty frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopEncoder;

impl Encoder for NopEncoder {
    fn encode(&self, _packet: Packet) -> Result<Frame, BoxError> {
        Ok(Frame::empty())
    }
}

/// The product of a codec factory.
///
/// Registration inspects a product once to decide whether it is an encoder or a
/// decoder. A product must expose exactly one of the two capabilities.
pub trait CodecProvider: Send + Sync {
    /// The encoder capability, if any.
    fn encoder(&self) -> Option<Arc<dyn Encoder>> {
        None
    }

    /// The decoder capability, if any.
    fn decoder(&self) -> Option<Arc<dyn Decoder>> {
        None
    }
}

/// Wraps a single encoder as a [`CodecProvider`].
pub struct EncoderProvider(pub Arc<dyn Encoder>);

impl CodecProvider for EncoderProvider {
    fn encoder(&self) -> Option<Arc<dyn Encoder>> {
        Some(self.0.clone())
    }
}

/// Wraps a single decoder as a [`CodecProvider`].
pub struct DecoderProvider(pub Arc<dyn Decoder>);

impl CodecProvider for DecoderProvider {
    fn decoder(&self) -> Option<Arc<dyn Decoder>> {
        Some(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nop_encoder_discards_packet() {
        let frame = NopEncoder.encode(Packet::new().with_field("k", 1)).unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn test_providers_expose_one_capability() {
        let enc = EncoderProvider(Arc::new(NopEncoder));
        assert!(enc.encoder().is_some());
        assert!(enc.decoder().is_none());
    }
}
