//! Testing utilities for Portico.
//!
//! Doubles for exercising registration, dispatch and network ingestion
//! without real hardware.
//!
//! # Features
//!
//! - [`RecordingInputDeliverer`]: records every frame an input device pushes
//! - [`RecordingDriver`]: records every dispatch it sees and can reply, fail
//!   or command output devices
//! - [`RecordingOutputDevice`]: records every command frame it receives
//! - [`FlagInterceptor`]: sets one attribute and continues (or stops)
//! - [`PayloadDecoder`] / [`PayloadEncoder`]: UTF-8 text codecs
//! - [`Journal`]: a shared log for asserting cross-component ordering

use portico_core::{
    Attributes, BoxError, BoxFuture, Component, Context, Decoder, DeviceAddress, DeviceBase,
    DriveRequest, DriveResult, Driver, Encoder, Frame, InputDeliverer, InterceptOutcome,
    InterceptRequest, InterceptResult, Interceptor, OutputDevice, Packet, VirtualDevice,
};
use serde_json::Value;
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Journal
// ============================================================================

/// A shared, ordered log of labels.
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a label.
    pub fn push(&self, label: impl Into<String>) {
        lock(&self.entries).push(label.into());
    }

    /// A copy of every label, in append order.
    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }
}

// ============================================================================
// Codecs
// ============================================================================

/// Decodes a frame into a packet with a single `payload` text field.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadDecoder;

impl Decoder for PayloadDecoder {
    fn decode(&self, frame: Frame) -> Result<Packet, BoxError> {
        let text = String::from_utf8(frame.into_bytes())?;
        Ok(Packet::new().with_field("payload", text))
    }
}

/// Encodes a packet's `payload` text field; other packets encode as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadEncoder;

impl Encoder for PayloadEncoder {
    fn encode(&self, packet: Packet) -> Result<Frame, BoxError> {
        match packet.field("payload") {
            Some(Value::String(text)) => Ok(Frame::from(text.as_bytes())),
            _ => Ok(Frame::new(serde_json::to_vec(packet.fields())?)),
        }
    }
}

// ============================================================================
// Recording Input Deliverer
// ============================================================================

/// One frame pushed by an input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    /// The routing topic.
    pub topic: String,
    /// The raw bytes.
    pub bytes: Vec<u8>,
}

/// An [`InputDeliverer`] that records every frame.
///
/// # Example
///
/// ```rust,ignore
/// let deliverer = RecordingInputDeliverer::new();
/// tokio::spawn({
///     let deliverer = Arc::new(deliverer.clone());
///     async move { device.serve(deliverer).await }
/// });
/// assert!(deliverer.wait_for(1, Duration::from_secs(1)).await);
/// ```
#[derive(Clone, Default)]
pub struct RecordingInputDeliverer {
    delivered: Arc<Mutex<Vec<Delivered>>>,
}

impl RecordingInputDeliverer {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every recorded frame.
    pub fn delivered(&self) -> Vec<Delivered> {
        lock(&self.delivered).clone()
    }

    /// Number of recorded frames.
    pub fn count(&self) -> usize {
        lock(&self.delivered).len()
    }

    /// Poll until at least `n` frames were recorded or `within` elapses.
    pub async fn wait_for(&self, n: usize, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            if self.count() >= n {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl InputDeliverer for RecordingInputDeliverer {
    fn broadcast<'a>(
        &'a self,
        topic: &'a str,
        frame: Frame,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        lock(&self.delivered).push(Delivered {
            topic: topic.to_string(),
            bytes: frame.into_bytes(),
        });
        Box::pin(async { Ok(()) })
    }
}

// ============================================================================
// Recording Driver
// ============================================================================

/// One dispatch seen by a [`RecordingDriver`].
#[derive(Debug, Clone)]
pub struct DriveRecord {
    /// The routing topic.
    pub topic: String,
    /// The source device.
    pub uuid: String,
    /// The packet.
    pub packet: Packet,
    /// The attributes as left by the interceptor chain.
    pub attrs: Attributes,
}

#[derive(Clone)]
enum Command {
    Deliver { uuid: String, packet: Packet },
    Broadcast { topic: String, packet: Packet },
}

/// A driver that records every dispatch.
///
/// Clones share their records, so a clone can be handed to a factory while
/// the test keeps the original.
#[derive(Clone, Default)]
pub struct RecordingDriver {
    records: Arc<Mutex<Vec<DriveRecord>>>,
    journal: Option<(Journal, String)>,
    reply: Option<Packet>,
    failure: Option<String>,
    command: Option<Command>,
    unfiltered: bool,
}

impl RecordingDriver {
    /// A driver that records and returns no reply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `reply` from every drive.
    pub fn replying(mut self, reply: Packet) -> Self {
        self.reply = Some(reply);
        self
    }

    /// Fail every drive with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Deliver `packet` to the output device `uuid` on every drive and return
    /// the device's decoded reply.
    pub fn delivering(mut self, uuid: impl Into<String>, packet: Packet) -> Self {
        self.command = Some(Command::Deliver {
            uuid: uuid.into(),
            packet,
        });
        self
    }

    /// Broadcast `packet` on `topic` on every drive and reply with the number
    /// of accepting devices under `accepted`.
    pub fn broadcasting(mut self, topic: impl Into<String>, packet: Packet) -> Self {
        self.command = Some(Command::Broadcast {
            topic: topic.into(),
            packet,
        });
        self
    }

    /// Append `label` to `journal` on every drive.
    pub fn with_journal(mut self, journal: &Journal, label: impl Into<String>) -> Self {
        self.journal = Some((journal.clone(), label.into()));
        self
    }

    /// Opt out of topic filtering.
    pub fn unfiltered(mut self) -> Self {
        self.unfiltered = true;
        self
    }

    /// A copy of every recorded dispatch.
    pub fn records(&self) -> Vec<DriveRecord> {
        lock(&self.records).clone()
    }

    /// Number of recorded dispatches.
    pub fn count(&self) -> usize {
        lock(&self.records).len()
    }
}

impl Component for RecordingDriver {}

impl Driver for RecordingDriver {
    async fn drive(&self, request: DriveRequest<'_>) -> DriveResult {
        if let Some((journal, label)) = &self.journal {
            journal.push(label.clone());
        }
        lock(&self.records).push(DriveRecord {
            topic: request.topic.to_string(),
            uuid: request.uuid.to_string(),
            packet: request.packet.clone(),
            attrs: request.attrs.clone(),
        });

        if let Some(message) = &self.failure {
            return Err(message.clone().into());
        }

        match &self.command {
            Some(Command::Deliver { uuid, packet }) => {
                let reply = request.deliverer.deliver(uuid, packet.clone()).await?;
                Ok(reply.or_else(|| self.reply.clone()))
            }
            Some(Command::Broadcast { topic, packet }) => {
                let accepted = request.deliverer.broadcast(topic, packet.clone()).await;
                Ok(Some(Packet::new().with_field("accepted", accepted)))
            }
            None => Ok(self.reply.clone()),
        }
    }

    fn topic_filtered(&self) -> bool {
        !self.unfiltered
    }
}

// ============================================================================
// Flag Interceptor
// ============================================================================

/// An interceptor that sets one boolean attribute.
#[derive(Clone)]
pub struct FlagInterceptor {
    key: String,
    result: InterceptResult,
    failure: Option<String>,
    journal: Option<Journal>,
}

impl FlagInterceptor {
    /// Set `attrs[key] = true` and continue.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            result: InterceptResult::Next,
            failure: None,
            journal: None,
        }
    }

    /// Return `result` instead of `Next`.
    pub fn with_result(mut self, result: InterceptResult) -> Self {
        self.result = result;
        self
    }

    /// Fail with `message` instead of setting the flag.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Append the flag key to `journal` on every call.
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }
}

impl Component for FlagInterceptor {}

impl Interceptor for FlagInterceptor {
    async fn intercept(&self, mut request: InterceptRequest<'_>) -> InterceptOutcome {
        if let Some(journal) = &self.journal {
            journal.push(self.key.clone());
        }
        if let Some(message) = &self.failure {
            return Err(message.clone().into());
        }
        request.attrs.insert(self.key.clone(), true);
        Ok(self.result)
    }
}

// ============================================================================
// Recording Output Device
// ============================================================================

/// An output device that records every command frame.
///
/// Its default codecs are [`PayloadEncoder`] and [`PayloadDecoder`], so it
/// can be assembled from configuration without naming codecs.
#[derive(Clone)]
pub struct RecordingOutputDevice {
    base: DeviceBase,
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
    reply: Option<Vec<u8>>,
}

impl Default for RecordingOutputDevice {
    fn default() -> Self {
        Self {
            base: DeviceBase::new()
                .with_encoder(Arc::new(PayloadEncoder))
                .with_decoder(Arc::new(PayloadDecoder)),
            frames: Arc::new(Mutex::new(Vec::new())),
            reply: None,
        }
    }
}

impl RecordingOutputDevice {
    /// An unconfigured device, for assembly from configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// A device with its identity already set, for direct registration.
    pub fn named(name: &str, uuid: &str) -> Self {
        let mut device = Self::default();
        device.base.set_name(name);
        device.base.set_address(DeviceAddress::new(uuid, "test", name));
        device
    }

    /// Set the broadcast topic pattern.
    pub fn with_topic(mut self, pattern: &str) -> Self {
        self.base.set_topic(pattern);
        self
    }

    /// Answer every command with `bytes`.
    pub fn replying(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.reply = Some(bytes.into());
        self
    }

    /// A copy of every received frame.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        lock(&self.frames).clone()
    }
}

impl Component for RecordingOutputDevice {}

impl VirtualDevice for RecordingOutputDevice {
    fn base(&self) -> &DeviceBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DeviceBase {
        &mut self.base
    }
}

impl OutputDevice for RecordingOutputDevice {
    async fn process(&self, frame: Frame, _ctx: &Context) -> Result<Option<Frame>, BoxError> {
        lock(&self.frames).push(frame.into_bytes());
        Ok(self.reply.clone().map(Frame::new))
    }
}
