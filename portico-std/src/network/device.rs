//! The TCP/UDP input device.

use super::{
    reader::{self, ReadSettings, Sink},
    transport::Transport,
};
use portico_core::{
    BoxError, BoxFuture, Component, Config, ConfigError, Context, DeviceBase, Frame, Initialize,
    InputDeliverer, InputDevice, NopEncoder, TransportError, VirtualDevice,
};
use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};
use tokio::{
    net::{TcpListener, UdpSocket},
    sync::watch,
};
use tracing::{debug, info};

/// Read buffer size used when configuration gives none.
pub const DEFAULT_BUFFER_SIZE: usize = 512;

/// Read timeout used when configuration gives none.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);

/// Handles one received frame.
///
/// Returning an error ends the read loop that produced the frame.
pub type ServeHandler = Arc<
    dyn Fn(Frame, Arc<dyn InputDeliverer>) -> BoxFuture<'static, Result<(), BoxError>>
        + Send
        + Sync,
>;

/// The default handler: broadcast every frame on `topic`.
pub fn broadcast_handler(topic: impl Into<Arc<str>>) -> ServeHandler {
    let topic: Arc<str> = topic.into();
    Arc::new(
        move |frame: Frame,
              deliverer: Arc<dyn InputDeliverer>|
              -> BoxFuture<'static, Result<(), BoxError>> {
            let topic = topic.clone();
            Box::pin(async move { deliverer.broadcast(&topic, frame).await })
        },
    )
}

/// An input device reading frames from a TCP listener or a UDP socket.
///
/// # Initialization arguments
///
/// | key | meaning | default |
/// |---|---|---|
/// | `networkAddress` | bind address, e.g. `0.0.0.0:5000` | required |
/// | `network` | `tcp` or `udp`, unless fixed by the constructor | required |
/// | `bufferSize` | read buffer in bytes | 512 |
/// | `bufferSizeKB` | read buffer in KiB, when `bufferSize` is absent | |
/// | `readTimeout` | ms integer or `"3s"` / `"500ms"` | 3s |
/// | `topic` | topic for the default handler | the device topic |
///
/// Initialization fails when the address or the transport is still unset
/// afterwards.
///
/// # Lifecycle
///
/// `on_start` re-arms the cancellation signal and installs the default
/// handler, `serve` runs until `on_stop` raises the signal, and `on_stop`
/// does nothing else. A stopped device can be started again.
pub struct NetworkInputDevice {
    base: DeviceBase,
    transport: Option<Transport>,
    fixed_transport: bool,
    address: String,
    handler_topic: Option<String>,
    settings: ReadSettings,
    handler: RwLock<Option<ServeHandler>>,
    cancel: watch::Sender<bool>,
    bound: watch::Sender<Option<SocketAddr>>,
}

impl Default for NetworkInputDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkInputDevice {
    /// A device whose transport comes from the `network` argument.
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        let (bound, _) = watch::channel(None);
        Self {
            base: DeviceBase::new().with_encoder(Arc::new(NopEncoder)),
            transport: None,
            fixed_transport: false,
            address: String::new(),
            handler_topic: None,
            settings: ReadSettings {
                buffer_size: DEFAULT_BUFFER_SIZE,
                read_timeout: DEFAULT_READ_TIMEOUT,
            },
            handler: RwLock::new(None),
            cancel,
            bound,
        }
    }

    /// A TCP device.
    pub fn tcp() -> Self {
        Self::with_transport(Transport::Tcp)
    }

    /// A UDP device.
    pub fn udp() -> Self {
        Self::with_transport(Transport::Udp)
    }

    fn with_transport(transport: Transport) -> Self {
        let mut device = Self::new();
        device.transport = Some(transport);
        device.fixed_transport = true;
        device
    }

    /// Set the bind address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the topic used by the default handler.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.handler_topic = Some(topic.into());
        self
    }

    /// Set the read buffer size.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.settings.buffer_size = size;
        self
    }

    /// Set the bound on each read.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.settings.read_timeout = read_timeout;
        self
    }

    /// The transport, once known.
    pub fn transport(&self) -> Option<Transport> {
        self.transport
    }

    /// The configured bind address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The topic the default handler broadcasts on.
    pub fn topic(&self) -> &str {
        self.handler_topic
            .as_deref()
            .unwrap_or_else(|| self.base.topic())
    }

    /// The read buffer size in bytes.
    pub fn buffer_size(&self) -> usize {
        self.settings.buffer_size
    }

    /// The bound on each read.
    pub fn read_timeout(&self) -> Duration {
        self.settings.read_timeout
    }

    /// Replace the default handler. Must be called before `on_start`.
    pub fn set_serve_handler(&self, handler: ServeHandler) {
        *self.handler.write().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    fn serve_handler(&self) -> Option<ServeHandler> {
        self.handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The socket address while serving.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.bound.borrow()
    }

    /// Wait until `serve` has bound its socket.
    pub async fn wait_bound(&self) -> SocketAddr {
        let mut bound = self.bound.subscribe();
        loop {
            if let Some(addr) = *bound.borrow_and_update() {
                return addr;
            }
            // The sender lives as long as `self`, so `changed` cannot fail here.
            let _ = bound.changed().await;
        }
    }

    async fn run(&self, sink: Sink, transport: Transport) -> Result<(), TransportError> {
        let cancel = self.cancel.subscribe();
        let bind_error = |source| TransportError::Bind {
            address: self.address.clone(),
            source,
        };
        match transport {
            Transport::Udp => {
                let socket = UdpSocket::bind(&self.address).await.map_err(bind_error)?;
                self.bound.send_replace(socket.local_addr().ok());
                reader::serve_udp(socket, sink, cancel, self.settings).await
            }
            Transport::Tcp => {
                let listener = TcpListener::bind(&self.address).await.map_err(bind_error)?;
                self.bound.send_replace(listener.local_addr().ok());
                reader::serve_tcp(listener, sink, cancel, self.settings).await
            }
        }
    }
}

fn positive(key: &str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            expected: "a positive size",
        });
    }
    Ok(value)
}

impl Initialize for NetworkInputDevice {
    fn on_init(&mut self, args: &Config) -> Result<(), BoxError> {
        if let Some(network) = args.get_non_empty_str("network") {
            let transport = network.parse::<Transport>()?;
            if !self.fixed_transport {
                self.transport = Some(transport);
            }
        }
        if let Some(address) = args.get_non_empty_str("networkAddress") {
            self.address = address.to_string();
        }
        if let Some(topic) = args.get_non_empty_str("topic") {
            self.handler_topic = Some(topic.to_string());
        }

        self.settings.buffer_size = if args.get("bufferSize").is_some() {
            positive("bufferSize", args.get_usize_or("bufferSize", DEFAULT_BUFFER_SIZE)?)?
        } else if args.get("bufferSizeKB").is_some() {
            let kib = positive("bufferSizeKB", args.get_usize_or("bufferSizeKB", 0)?)?;
            kib.saturating_mul(1024)
        } else {
            self.settings.buffer_size
        };

        let read_timeout = args.get_duration_or("readTimeout", self.settings.read_timeout)?;
        if read_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "readTimeout".to_string(),
                expected: "a positive duration",
            }
            .into());
        }
        self.settings.read_timeout = read_timeout;

        if self.address.is_empty() {
            return Err(TransportError::UnsetAddress.into());
        }
        if self.transport.is_none() {
            return Err(TransportError::UnsetTransport.into());
        }
        Ok(())
    }
}

impl Component for NetworkInputDevice {
    fn as_initialize(&mut self) -> Option<&mut dyn Initialize> {
        Some(self)
    }
}

impl VirtualDevice for NetworkInputDevice {
    fn base(&self) -> &DeviceBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DeviceBase {
        &mut self.base
    }

    fn on_start(&self, _ctx: &Context) -> Result<(), BoxError> {
        self.cancel.send_replace(false);
        if self.address.is_empty() {
            return Err(TransportError::UnsetAddress.into());
        }
        if self.transport.is_none() {
            return Err(TransportError::UnsetTransport.into());
        }

        let mut handler = self.handler.write().unwrap_or_else(PoisonError::into_inner);
        if handler.is_none() {
            let topic = self.topic();
            if topic.is_empty() {
                return Err(TransportError::MissingTopic.into());
            }
            debug!(name = self.base.name(), topic, "installing default serve handler");
            *handler = Some(broadcast_handler(topic));
        }
        Ok(())
    }

    fn on_stop(&self, _ctx: &Context) -> Result<(), BoxError> {
        self.cancel.send_replace(true);
        Ok(())
    }
}

impl InputDevice for NetworkInputDevice {
    async fn serve(&self, deliverer: Arc<dyn InputDeliverer>) -> Result<(), BoxError> {
        let handler = self.serve_handler().ok_or(TransportError::MissingHandler)?;
        let transport = self.transport.ok_or(TransportError::UnsetTransport)?;
        if self.address.is_empty() {
            return Err(TransportError::UnsetAddress.into());
        }

        info!(
            name = self.base.name(),
            %transport,
            address = %self.address,
            "network input device serving"
        );
        let result = self.run(Sink { handler, deliverer }, transport).await;
        self.bound.send_replace(None);
        info!(name = self.base.name(), "network input device stopped");
        Ok(result?)
    }
}
