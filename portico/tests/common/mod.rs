#![allow(dead_code)]

use portico::{
    BoxError, Component, DecoderProvider, DeviceAddress, DeviceBase, EncoderProvider, Frame,
    InputDeliverer, InputDevice, RegistrationBuilder, VirtualDevice,
    testing::{PayloadDecoder, PayloadEncoder},
};
use std::{
    net::{TcpListener, UdpSocket},
    sync::Arc,
    time::Duration,
};

// ============================================================================
// Codecs
// ============================================================================

/// Register `text-in` (decoder) and `text-out` (encoder) through codec
/// factories, the way a gateway binary would.
pub fn register_text_codecs(builder: &mut RegistrationBuilder) {
    builder
        .add_codec_factory("text-in", || DecoderProvider(Arc::new(PayloadDecoder)))
        .unwrap();
    builder
        .add_codec_factory("text-out", || EncoderProvider(Arc::new(PayloadEncoder)))
        .unwrap();
}

// ============================================================================
// Scripted Input Device
// ============================================================================

/// An input device that broadcasts a fixed list of frames on its own topic,
/// then returns.
#[derive(Clone, Default)]
pub struct ScriptedInput {
    base: DeviceBase,
    frames: Vec<Vec<u8>>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self {
            base: DeviceBase::new()
                .with_encoder(Arc::new(PayloadEncoder))
                .with_decoder(Arc::new(PayloadDecoder)),
            frames: Vec::new(),
        }
    }

    pub fn named(name: &str, uuid: &str, topic: &str) -> Self {
        let mut device = Self::new();
        device.base.set_name(name);
        device.base.set_address(DeviceAddress::new(uuid, "test", name));
        device.base.set_topic(topic);
        device
    }

    pub fn with_frame(mut self, bytes: &str) -> Self {
        self.frames.push(bytes.as_bytes().to_vec());
        self
    }
}

impl Component for ScriptedInput {}

impl VirtualDevice for ScriptedInput {
    fn base(&self) -> &DeviceBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DeviceBase {
        &mut self.base
    }
}

impl InputDevice for ScriptedInput {
    async fn serve(&self, deliverer: Arc<dyn InputDeliverer>) -> Result<(), BoxError> {
        for bytes in &self.frames {
            deliverer
                .broadcast(self.base.topic(), Frame::new(bytes.clone()))
                .await?;
        }
        Ok(())
    }
}

// ============================================================================
// Sockets
// ============================================================================

/// A loopback UDP address that was free a moment ago.
pub fn free_udp_addr() -> String {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap().to_string()
}

/// A loopback TCP address that was free a moment ago.
pub fn free_tcp_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

// ============================================================================
// Polling
// ============================================================================

/// Poll `condition` until it holds or `within` elapses.
pub async fn eventually(within: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
