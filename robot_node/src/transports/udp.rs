//! UDP topic transport.
//!
//! One message per datagram, UTF-8, `"<topic> <payload>"`:
//!
//! ```text
//! action turn_left
//! state east false
//! ```
//!
//! Published messages go to every configured peer. Inbound datagrams are
//! routed to subscriptions by topic; datagrams for topics nobody subscribed
//! to are dropped. Datagrams must be shorter than `MAX_DATAGRAM_SIZE`
//! bytes; anything that fills the receive buffer may have been truncated
//! and is dropped.

use super::{TopicTable, spawn_dispatcher};
use robot_common::bus::config::TransportConfig;
use robot_common::bus::consts::{MAX_DATAGRAM_SIZE, RECV_POLL_INTERVAL};
use robot_common::bus::transport::{
    MessageCallback, Publisher, Subscription, Transport, TransportError, validate_topic,
};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Frame a message for the wire.
pub fn encode_datagram(topic: &str, payload: &str) -> String {
    format!("{topic} {payload}")
}

/// Split a datagram into topic and payload.
///
/// Returns `None` for non-UTF-8 data or datagrams without a separator.
/// Trailing line endings are ignored so `nc`-style tools work.
pub fn decode_datagram(bytes: &[u8]) -> Option<(&str, &str)> {
    let text = std::str::from_utf8(bytes).ok()?;
    let text = text.trim_end_matches(['\r', '\n']);
    let (topic, payload) = text.split_once(' ')?;
    if topic.is_empty() {
        return None;
    }
    Some((topic, payload))
}

/// Publisher sending one topic to all peers.
pub struct UdpPublisher {
    socket: Arc<UdpSocket>,
    peers: Vec<SocketAddr>,
    topic: String,
}

impl Publisher for UdpPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&self, payload: &str) -> Result<(), TransportError> {
        let frame = encode_datagram(&self.topic, payload);
        let mut failures = Vec::new();
        for peer in &self.peers {
            if let Err(e) = self.socket.send_to(frame.as_bytes(), peer) {
                failures.push(format!("{peer}: {e}"));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TransportError::PublishFailed {
                topic: self.topic.clone(),
                reason: failures.join(", "),
            })
        }
    }
}

/// Receive thread handle.
struct ReceiveThread {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ReceiveThread {
    /// Signal the thread and wait for it to exit.
    fn shutdown(self) {
        self.stop.store(true, Ordering::SeqCst);
        if self.handle.join().is_err() {
            warn!("UDP receiver thread panicked");
        }
    }
}

/// Route one received datagram.
///
/// Returns `true` if at least one subscriber queue accepted it.
fn route_datagram(table: &TopicTable, datagram: &[u8], src: SocketAddr) -> bool {
    if datagram.len() >= MAX_DATAGRAM_SIZE {
        debug!(
            "Dropping oversized datagram from {} (limit {} bytes)",
            src, MAX_DATAGRAM_SIZE
        );
        return false;
    }
    let Some((topic, payload)) = decode_datagram(datagram) else {
        debug!("Dropping malformed datagram ({} bytes) from {}", datagram.len(), src);
        return false;
    };
    let delivered = table.route(topic, payload);
    if delivered == 0 && !table.has_route(topic) {
        debug!("Dropping datagram from {} for unsubscribed topic '{}'", src, topic);
    }
    delivered > 0
}

/// `Transport` over a single UDP socket.
#[derive(Default)]
pub struct UdpTransport {
    socket: Option<Arc<UdpSocket>>,
    peers: Vec<SocketAddr>,
    table: Arc<TopicTable>,
    receiver: Option<ReceiveThread>,
}

impl UdpTransport {
    /// Create an unconnected transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Address the socket is bound to, once connected.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    fn connected_socket(&self) -> Result<&Arc<UdpSocket>, TransportError> {
        self.socket.as_ref().ok_or(TransportError::NotConnected)
    }

    fn spawn_receiver(
        socket: Arc<UdpSocket>,
        table: Arc<TopicTable>,
    ) -> Result<ReceiveThread, TransportError> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("udp-recv".to_string())
            .spawn(move || {
                let mut buf = [0u8; MAX_DATAGRAM_SIZE];
                while !thread_stop.load(Ordering::SeqCst) {
                    match socket.recv_from(&mut buf) {
                        Ok((len, src)) => {
                            route_datagram(&table, &buf[..len], src);
                        }
                        Err(e)
                            if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                        Err(e) => {
                            warn!("UDP receive error: {}", e);
                            thread::sleep(RECV_POLL_INTERVAL);
                        }
                    }
                }
                debug!("UDP receiver exiting");
            })
            .map_err(|e| TransportError::Io(e.to_string()))?;

        Ok(ReceiveThread { stop, handle })
    }
}

impl Transport for UdpTransport {
    fn name(&self) -> &'static str {
        "udp"
    }

    fn connect(&mut self, config: &TransportConfig) -> Result<(), TransportError> {
        if self.socket.is_some() {
            return Ok(());
        }

        let socket = UdpSocket::bind(config.udp.bind).map_err(|e| {
            TransportError::ConnectFailed(format!("bind {}: {}", config.udp.bind, e))
        })?;
        socket
            .set_read_timeout(Some(RECV_POLL_INTERVAL))
            .map_err(|e| TransportError::Io(e.to_string()))?;
        let socket = Arc::new(socket);

        self.receiver = Some(Self::spawn_receiver(
            Arc::clone(&socket),
            Arc::clone(&self.table),
        )?);
        self.peers = config.udp.peers.clone();
        self.socket = Some(socket);

        info!(
            "UDP transport bound to {:?}, publishing to {} peer(s)",
            self.local_addr(),
            self.peers.len()
        );
        if self.peers.is_empty() {
            warn!("UDP transport has no peers; published messages go nowhere");
        }
        Ok(())
    }

    fn advertise(
        &mut self,
        topic: &str,
        _queue_size: usize,
    ) -> Result<Box<dyn Publisher>, TransportError> {
        validate_topic(topic)?;
        let socket = Arc::clone(self.connected_socket()?);
        Ok(Box::new(UdpPublisher {
            socket,
            peers: self.peers.clone(),
            topic: topic.to_string(),
        }))
    }

    fn subscribe(
        &mut self,
        topic: &str,
        queue_size: usize,
        callback: MessageCallback,
    ) -> Result<Subscription, TransportError> {
        validate_topic(topic)?;
        self.connected_socket()?;
        let rx = self.table.add(topic, queue_size);
        spawn_dispatcher(topic, rx, callback)
    }

    fn shutdown(&mut self) -> Result<(), TransportError> {
        if let Some(receiver) = self.receiver.take() {
            receiver.shutdown();
        }
        self.table.clear();
        self.socket = None;
        info!("UDP transport shut down");
        Ok(())
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            receiver.shutdown();
        }
    }
}

/// Factory function to create a UDP transport instance.
pub fn create_transport() -> Box<dyn Transport> {
    Box::new(UdpTransport::new())
}
