//! Bounded read loops.
//!
//! Every loop checks the cancellation signal before each read and bounds each
//! read by the configured timeout. A timeout or a transient error just starts
//! the next iteration.

use super::device::ServeHandler;
use portico_core::{Frame, InputDeliverer, TransportError, is_transient};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{
    io::AsyncReadExt,
    net::{TcpListener, TcpStream, UdpSocket},
    sync::watch,
    task::{JoinError, JoinSet},
    time::timeout,
};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy)]
pub(super) struct ReadSettings {
    pub(super) buffer_size: usize,
    pub(super) read_timeout: Duration,
}

fn cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

/// Where every loop of one `serve` call sends its frames.
#[derive(Clone)]
pub(super) struct Sink {
    pub(super) handler: ServeHandler,
    pub(super) deliverer: Arc<dyn InputDeliverer>,
}

impl Sink {
    async fn push(&self, bytes: &[u8]) -> Result<(), TransportError> {
        (self.handler)(Frame::from(bytes), self.deliverer.clone())
            .await
            .map_err(TransportError::Handler)
    }
}

pub(super) async fn serve_udp(
    socket: UdpSocket,
    sink: Sink,
    cancel: watch::Receiver<bool>,
    settings: ReadSettings,
) -> Result<(), TransportError> {
    let mut buffer = vec![0u8; settings.buffer_size];
    loop {
        if cancelled(&cancel) {
            debug!("udp loop cancelled");
            return Ok(());
        }
        match timeout(settings.read_timeout, socket.recv_from(&mut buffer)).await {
            Err(_elapsed) => continue,
            Ok(Ok((0, _))) => continue,
            Ok(Ok((n, peer))) => {
                if let Err(err) = sink.push(&buffer[..n]).await {
                    warn!(%peer, error = %err, "udp serve handler failed");
                    return Err(err);
                }
            }
            Ok(Err(err)) if is_transient(&err) => {
                debug!(error = %err, "transient udp read error");
            }
            Ok(Err(err)) => return Err(err.into()),
        }
    }
}

pub(super) async fn serve_tcp(
    listener: TcpListener,
    sink: Sink,
    cancel: watch::Receiver<bool>,
    settings: ReadSettings,
) -> Result<(), TransportError> {
    let mut connections = JoinSet::new();
    let result = loop {
        if cancelled(&cancel) {
            debug!("tcp accept loop cancelled");
            break Ok(());
        }
        while let Some(joined) = connections.try_join_next() {
            log_connection(joined);
        }
        match timeout(settings.read_timeout, listener.accept()).await {
            Err(_elapsed) => continue,
            Ok(Ok((stream, peer))) => {
                debug!(%peer, "connection accepted");
                connections.spawn(read_connection(
                    stream,
                    peer,
                    sink.clone(),
                    cancel.clone(),
                    settings,
                ));
            }
            Ok(Err(err)) if is_transient(&err) => {
                warn!(error = %err, "transient accept error");
            }
            Ok(Err(err)) => {
                error!(error = %err, "tcp accept failed");
                break Err(TransportError::Io(err));
            }
        }
    };
    drop(listener);

    if result.is_err() {
        connections.shutdown().await;
    } else {
        while let Some(joined) = connections.join_next().await {
            log_connection(joined);
        }
    }
    result
}

async fn read_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    sink: Sink,
    cancel: watch::Receiver<bool>,
    settings: ReadSettings,
) -> (SocketAddr, Result<(), TransportError>) {
    let mut buffer = vec![0u8; settings.buffer_size];
    let result = loop {
        if cancelled(&cancel) {
            break Ok(());
        }
        match timeout(settings.read_timeout, stream.read(&mut buffer)).await {
            Err(_elapsed) => continue,
            Ok(Ok(0)) => {
                debug!(%peer, "connection closed by peer");
                break Ok(());
            }
            Ok(Ok(n)) => {
                if let Err(err) = sink.push(&buffer[..n]).await {
                    break Err(err);
                }
            }
            Ok(Err(err)) if is_transient(&err) => continue,
            Ok(Err(err)) => break Err(err.into()),
        }
    };
    (peer, result)
}

fn log_connection(joined: Result<(SocketAddr, Result<(), TransportError>), JoinError>) {
    match joined {
        Ok((peer, Ok(()))) => debug!(%peer, "connection finished"),
        Ok((peer, Err(err))) => error!(%peer, error = %err, "connection failed"),
        Err(err) => error!(error = %err, "connection task aborted"),
    }
}
