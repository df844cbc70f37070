mod common;

use common::{eventually, free_udp_addr, register_text_codecs};
use portico::{
    BoxError, BoxFuture, Bundle, Context, Dispatcher, DynInputDevice, Frame, InputDeliverer,
    InputDevice, RegistrationBuilder, VirtualDevice,
    config::from_toml_str,
    init_with_args,
    network::{NetworkInputDevice, ServeHandler},
    testing::{Journal, RecordingDriver, RecordingInputDeliverer},
};
use std::{sync::Arc, time::Duration};
use tokio::{net::UdpSocket, task::JoinHandle, time::timeout};

const READ_TIMEOUT: Duration = Duration::from_millis(100);
const STOP_MARGIN: Duration = Duration::from_millis(50);

async fn serving(
    device: NetworkInputDevice,
) -> (
    Arc<NetworkInputDevice>,
    RecordingInputDeliverer,
    JoinHandle<Result<(), BoxError>>,
) {
    device.on_start(&Context::new()).unwrap();
    let device = Arc::new(device);
    let deliverer = RecordingInputDeliverer::new();
    let handle = tokio::spawn({
        let device = device.clone();
        let deliverer = Arc::new(deliverer.clone());
        async move { device.serve(deliverer).await }
    });
    timeout(Duration::from_secs(2), device.wait_bound())
        .await
        .unwrap();
    (device, deliverer, handle)
}

#[tokio::test]
async fn test_udp_datagram_is_broadcast_on_default_topic() {
    let device = NetworkInputDevice::udp()
        .with_address("127.0.0.1:0")
        .with_topic("card.read")
        .with_read_timeout(READ_TIMEOUT);
    let (device, deliverer, handle) = serving(device).await;

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let target = device.local_addr().unwrap();
    sender.send_to(&[0xDE, 0xAD, 0xBE, 0xEF], target).await.unwrap();

    assert!(deliverer.wait_for(1, Duration::from_secs(2)).await);
    tokio::time::sleep(READ_TIMEOUT).await;
    let delivered = deliverer.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].topic, "card.read");
    assert_eq!(delivered[0].bytes, vec![0xDE, 0xAD, 0xBE, 0xEF]);

    device.on_stop(&Context::new()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_udp_stop_returns_within_read_timeout() {
    let address = free_udp_addr();
    let device = NetworkInputDevice::udp()
        .with_address(address.as_str())
        .with_topic("card.read")
        .with_read_timeout(READ_TIMEOUT);
    let (device, _deliverer, handle) = serving(device).await;

    device.on_stop(&Context::new()).unwrap();
    timeout(READ_TIMEOUT + STOP_MARGIN, handle)
        .await
        .expect("serve did not observe the stop signal")
        .unwrap()
        .unwrap();
    assert!(device.local_addr().is_none());

    // The socket is released once serve returns.
    std::net::UdpSocket::bind(address.as_str()).unwrap();
}

#[tokio::test]
async fn test_udp_datagram_is_truncated_to_buffer() {
    let device = NetworkInputDevice::udp()
        .with_address("127.0.0.1:0")
        .with_topic("card.read")
        .with_buffer_size(4)
        .with_read_timeout(READ_TIMEOUT);
    let (device, deliverer, handle) = serving(device).await;

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender
        .send_to(b"0123456789", device.local_addr().unwrap())
        .await
        .unwrap();

    assert!(deliverer.wait_for(1, Duration::from_secs(2)).await);
    assert_eq!(deliverer.delivered()[0].bytes, b"0123".to_vec());

    device.on_stop(&Context::new()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_udp_device_can_restart() {
    let device = NetworkInputDevice::udp()
        .with_address("127.0.0.1:0")
        .with_topic("card.read")
        .with_read_timeout(READ_TIMEOUT);
    let (device, _deliverer, handle) = serving(device).await;
    device.on_stop(&Context::new()).unwrap();
    handle.await.unwrap().unwrap();

    device.on_start(&Context::new()).unwrap();
    let deliverer = Arc::new(RecordingInputDeliverer::new());
    let handle = tokio::spawn({
        let device = device.clone();
        let deliverer = deliverer.clone();
        async move { device.serve(deliverer).await }
    });
    let addr = timeout(Duration::from_secs(2), device.wait_bound())
        .await
        .unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender.send_to(b"again", addr).await.unwrap();
    assert!(deliverer.wait_for(1, Duration::from_secs(2)).await);

    device.on_stop(&Context::new()).unwrap();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_custom_handler_replaces_broadcast() {
    let device = NetworkInputDevice::udp()
        .with_address("127.0.0.1:0")
        .with_read_timeout(READ_TIMEOUT);
    let journal = Journal::new();
    let shared = journal.clone();
    let handler: ServeHandler = Arc::new(
        move |frame: Frame,
              _deliverer: Arc<dyn InputDeliverer>|
              -> BoxFuture<'static, Result<(), BoxError>> {
            let journal = shared.clone();
            Box::pin(async move {
                journal.push(String::from_utf8_lossy(frame.as_bytes()).into_owned());
                Ok(())
            })
        },
    );
    device.set_serve_handler(handler);
    let (device, deliverer, handle) = serving(device).await;

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let target = device.local_addr().unwrap();
    sender.send_to(b"first", target).await.unwrap();
    sender.send_to(b"second", target).await.unwrap();

    assert!(eventually(Duration::from_secs(2), || journal.entries().len() == 2).await);
    assert_eq!(journal.entries(), vec!["first", "second"]);
    assert_eq!(deliverer.count(), 0);

    device.on_stop(&Context::new()).unwrap();
    handle.await.unwrap().unwrap();
}

// ============================================================================
// Assembled Reader
// ============================================================================

struct AssembledReader {
    address: String,
    driver: RecordingDriver,
    dispatcher: Arc<Dispatcher>,
    device: Arc<dyn DynInputDevice>,
    handle: JoinHandle<Result<(), BoxError>>,
    sender: UdpSocket,
}

impl AssembledReader {
    async fn start() -> Self {
        let address = free_udp_addr();
        let driver = RecordingDriver::new();

        let mut builder = RegistrationBuilder::new();
        register_text_codecs(&mut builder);
        builder
            .add_bundle_factory("udp-reader", || Bundle::input_device(NetworkInputDevice::udp()));
        let shared = driver.clone();
        builder.add_bundle_factory("door", move || Bundle::driver(shared.clone()));

        let document = from_toml_str(&format!(
            r#"
            [drivers.door]
            topics = ["card.read"]

            [inputs.front-reader]
            type = "udp-reader"
            name = "front reader"
            uuid = "reader-1"
            group = "lobby"
            private = "r1"
            decoder = "text-in"
            topic = "card.read"

            [inputs.front-reader.InitArgs]
            networkAddress = "{address}"
            readTimeout = 100
            "#
        ))
        .unwrap();
        builder.assemble(&document, init_with_args).unwrap();

        let dispatcher = Arc::new(Dispatcher::new(Arc::new(builder.build())));
        let device = dispatcher
            .registration()
            .input_device("reader-1")
            .unwrap()
            .clone();
        device.on_start(dispatcher.context()).unwrap();
        let handle = tokio::spawn({
            let device = device.clone();
            let deliverer = Arc::new(dispatcher.deliverer_for("reader-1"));
            async move { device.serve_dyn(deliverer).await }
        });

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        Self {
            address,
            driver,
            dispatcher,
            device,
            handle,
            sender,
        }
    }

    /// Send `bytes` until the driver has seen `count` dispatches.
    ///
    /// The socket binds asynchronously; datagrams sent before that are lost.
    async fn send_until(&self, bytes: &[u8], count: usize) -> bool {
        for _ in 0..40 {
            self.sender
                .send_to(bytes, self.address.as_str())
                .await
                .unwrap();
            if eventually(Duration::from_millis(50), || self.driver.count() >= count).await {
                return true;
            }
        }
        false
    }

    async fn stop(self) {
        self.device.on_stop(self.dispatcher.context()).unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_assembled_udp_reader_reaches_driver() {
    let reader = AssembledReader::start().await;
    assert!(reader.send_until(b"card:42", 1).await);

    let record = &reader.driver.records()[0];
    assert_eq!(record.topic, "card.read");
    assert_eq!(record.uuid, "reader-1");
    assert_eq!(record.packet.field("payload"), Some(&serde_json::json!("card:42")));

    reader.stop().await;
}

#[tokio::test]
async fn test_undecodable_datagram_does_not_end_ingestion() {
    let reader = AssembledReader::start().await;
    assert!(reader.send_until(b"card:1", 1).await);

    reader
        .sender
        .send_to(&[0xff, 0xfe], reader.address.as_str())
        .await
        .unwrap();
    reader
        .sender
        .send_to(b"card:2", reader.address.as_str())
        .await
        .unwrap();

    assert!(eventually(Duration::from_secs(2), || reader.driver.count() == 2).await);
    assert!(!reader.handle.is_finished());
    let payloads: Vec<_> = reader
        .driver
        .records()
        .into_iter()
        .map(|record| record.packet.field("payload").cloned())
        .collect();
    assert_eq!(
        payloads,
        vec![
            Some(serde_json::json!("card:1")),
            Some(serde_json::json!("card:2"))
        ]
    );

    reader.stop().await;
}
