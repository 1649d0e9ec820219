//! In-memory loopback transport used to exercise the decorators.
//!
//! [`LoopbackEndpoint`] is a deterministic, self-contained endpoint
//! implementation: connectors, acceptors, and transceivers all operate over
//! in-process byte queues, so tests run without network I/O or timing
//! dependence. The endpoint counts connector resolutions, which lets tests
//! assert that an injected fault stopped a resolution before it started.

use std::{
    any::Any,
    cmp::Ordering,
    collections::VecDeque,
    fmt,
    hash::{DefaultHasher, Hash, Hasher},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use sigil_core::{
    endpoint::{Endpoint, EndpointRef, TypeTag},
    error::TransportError,
    factory::EndpointFactory,
    transport::{Acceptor, Connector, Transceiver},
    wire,
};

/// Type tag of the loopback transport family.
pub const LOOPBACK_TYPE: TypeTag = 1;

/// Name that expands to one endpoint per loopback interface.
const WILDCARD: &str = "*";

/// Interfaces a wildcard endpoint expands to.
const INTERFACES: [&str; 2] = ["lo0", "lo1"];

/// Timeout wire sentinel for "no timeout".
const NO_TIMEOUT: u64 = u64::MAX;

/// Deterministic in-memory endpoint.
///
/// Stream endpoints hand out channels through their acceptor; datagram
/// endpoints expose a transceiver directly. Either flavor resolves a fixed
/// number of connectors.
#[derive(Debug, Clone)]
pub struct LoopbackEndpoint {
    name: String,
    connection_id: String,
    timeout: Option<Duration>,
    compress: bool,
    datagram: bool,
    connector_count: usize,
    resolutions: Arc<AtomicUsize>,
}

impl LoopbackEndpoint {
    /// Stream-oriented endpoint resolving `connector_count` addresses.
    #[must_use]
    pub fn stream(name: &str, connector_count: usize) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            connection_id: String::new(),
            timeout: None,
            compress: false,
            datagram: false,
            connector_count,
            resolutions: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Datagram-oriented endpoint; its transceiver is available without an
    /// acceptor.
    #[must_use]
    pub fn dgram(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            connection_id: String::new(),
            timeout: None,
            compress: false,
            datagram: true,
            connector_count: 1,
            resolutions: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Number of times connector resolution ran, across both the synchronous
    /// and asynchronous path.
    #[must_use]
    pub fn resolutions(&self) -> usize {
        self.resolutions.load(AtomicOrdering::SeqCst)
    }

    fn resolve(&self) -> Vec<Box<dyn Connector>> {
        self.resolutions.fetch_add(1, AtomicOrdering::SeqCst);
        tracing::debug!(endpoint = %self, count = self.connector_count, "resolving connectors");
        (0..self.connector_count)
            .map(|i| {
                Box::new(LoopbackConnector { address: format!("{}#{i}", self.name) })
                    as Box<dyn Connector>
            })
            .collect()
    }
}

#[async_trait]
impl Endpoint for LoopbackEndpoint {
    fn type_tag(&self) -> TypeTag {
        LOOPBACK_TYPE
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn with_timeout(self: Arc<Self>, timeout: Option<Duration>) -> EndpointRef {
        if self.timeout == timeout {
            self
        } else {
            Arc::new(Self { timeout, ..self.as_ref().clone() })
        }
    }

    fn with_connection_id(self: Arc<Self>, connection_id: &str) -> EndpointRef {
        if self.connection_id == connection_id {
            self
        } else {
            Arc::new(Self { connection_id: connection_id.to_string(), ..self.as_ref().clone() })
        }
    }

    fn compress(&self) -> bool {
        self.compress
    }

    fn with_compress(self: Arc<Self>, compress: bool) -> EndpointRef {
        if self.compress == compress {
            self
        } else {
            Arc::new(Self { compress, ..self.as_ref().clone() })
        }
    }

    fn datagram(&self) -> bool {
        self.datagram
    }

    fn secure(&self) -> bool {
        false
    }

    fn unknown(&self) -> bool {
        false
    }

    fn connectors(&self) -> Result<Vec<Box<dyn Connector>>, TransportError> {
        Ok(self.resolve())
    }

    async fn connectors_async(&self) -> Result<Vec<Box<dyn Connector>>, TransportError> {
        // Suspend before resolving, as a real address lookup would.
        tokio::task::yield_now().await;
        Ok(self.resolve())
    }

    fn acceptor(
        self: Arc<Self>,
        adapter_name: &str,
    ) -> Result<(Box<dyn Acceptor>, EndpointRef), TransportError> {
        tracing::debug!(endpoint = %self, adapter = adapter_name, "opening acceptor");
        let acceptor = LoopbackAcceptor::open(adapter_name);
        Ok((Box::new(acceptor), self))
    }

    fn transceiver(self: Arc<Self>) -> (Option<Box<dyn Transceiver>>, EndpointRef) {
        if self.datagram {
            let transceiver = LoopbackTransceiver::open(&self.name);
            (Some(Box::new(transceiver)), self)
        } else {
            (None, self)
        }
    }

    fn expand(self: Arc<Self>) -> Vec<EndpointRef> {
        if self.name == WILDCARD {
            INTERFACES
                .iter()
                .map(|interface| {
                    let endpoint: EndpointRef = Arc::new(Self {
                        name: (*interface).to_string(),
                        ..self.as_ref().clone()
                    });
                    endpoint
                })
                .collect()
        } else {
            vec![self]
        }
    }

    fn equivalent(&self, other: &dyn Endpoint) -> bool {
        // Same logical address; timeout/compress/connection-id are ignored.
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| self.name == other.name && self.datagram == other.datagram)
    }

    fn compare(&self, other: &dyn Endpoint) -> Ordering {
        let Some(peer) = other.as_any().downcast_ref::<Self>() else {
            return self.type_tag().cmp(&other.type_tag());
        };
        (&self.name, &self.connection_id, self.timeout, self.compress, self.datagram)
            .cmp(&(&peer.name, &peer.connection_id, peer.timeout, peer.compress, peer.datagram))
            .then(self.connector_count.cmp(&peer.connector_count))
    }

    fn endpoint_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.name.hash(&mut hasher);
        self.connection_id.hash(&mut hasher);
        self.timeout.hash(&mut hasher);
        self.compress.hash(&mut hasher);
        self.datagram.hash(&mut hasher);
        self.connector_count.hash(&mut hasher);
        hasher.finish()
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        wire::put_u16(buf, LOOPBACK_TYPE);
        wire::put_str(buf, &self.name);
        wire::put_str(buf, &self.connection_id);
        wire::put_u64(buf, self.timeout.map_or(NO_TIMEOUT, |t| t.as_millis() as u64));
        wire::put_bool(buf, self.compress);
        wire::put_bool(buf, self.datagram);
        wire::put_u64(buf, self.connector_count as u64);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for LoopbackEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loopback -h {}", self.name)?;
        if self.datagram {
            write!(f, " -d")?;
        }
        if let Some(timeout) = self.timeout {
            write!(f, " -t {}", timeout.as_millis())?;
        }
        if self.compress {
            write!(f, " -z")?;
        }
        Ok(())
    }
}

/// Decode factory for [`LoopbackEndpoint`] encodings.
#[derive(Debug, Default)]
pub struct LoopbackFactory;

impl EndpointFactory for LoopbackFactory {
    fn type_tag(&self) -> TypeTag {
        LOOPBACK_TYPE
    }

    fn decode(&self, buf: &mut Bytes) -> Result<EndpointRef, TransportError> {
        let name = wire::get_str(buf)?;
        let connection_id = wire::get_str(buf)?;
        let timeout_ms = wire::get_u64(buf)?;
        let compress = wire::get_bool(buf)?;
        let datagram = wire::get_bool(buf)?;
        let connector_count = wire::get_u64(buf)? as usize;

        Ok(Arc::new(LoopbackEndpoint {
            name,
            connection_id,
            timeout: (timeout_ms != NO_TIMEOUT).then(|| Duration::from_millis(timeout_ms)),
            compress,
            datagram,
            connector_count,
            resolutions: Arc::new(AtomicUsize::new(0)),
        }))
    }
}

/// Connector to one resolved loopback address.
#[derive(Debug)]
pub struct LoopbackConnector {
    address: String,
}

impl Connector for LoopbackConnector {
    fn connect(&self) -> Result<Box<dyn Transceiver>, TransportError> {
        Ok(Box::new(LoopbackTransceiver::open(&self.address)))
    }
}

impl fmt::Display for LoopbackConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// Accepts in-memory channels for a named adapter.
#[derive(Debug)]
pub struct LoopbackAcceptor {
    adapter_name: String,
    closed: bool,
}

impl LoopbackAcceptor {
    fn open(adapter_name: &str) -> Self {
        Self { adapter_name: adapter_name.to_string(), closed: false }
    }
}

impl Acceptor for LoopbackAcceptor {
    fn accept(&mut self) -> Result<Box<dyn Transceiver>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        Ok(Box::new(LoopbackTransceiver::open(&self.adapter_name)))
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }
}

impl fmt::Display for LoopbackAcceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "accept:{}", self.adapter_name)
    }
}

/// In-memory byte channel.
///
/// Writes append to an internal queue and reads drain it, so the channel
/// behaves as a loopback echo.
#[derive(Debug)]
pub struct LoopbackTransceiver {
    peer: String,
    queue: VecDeque<u8>,
    closed: bool,
}

impl LoopbackTransceiver {
    fn open(peer: &str) -> Self {
        Self { peer: peer.to_string(), queue: VecDeque::new(), closed: false }
    }
}

impl Transceiver for LoopbackTransceiver {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let mut read = 0;
        while read < buf.len() {
            match self.queue.pop_front() {
                Some(byte) => {
                    buf[read] = byte;
                    read += 1;
                }
                None => break,
            }
        }
        Ok(read)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.queue.extend(buf.iter().copied());
        Ok(buf.len())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }
}

impl fmt::Display for LoopbackTransceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel:{}", self.peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_timeout_returns_same_instance() {
        let endpoint: EndpointRef = LoopbackEndpoint::stream("lo0", 1);
        let endpoint_ref: EndpointRef = Arc::clone(&endpoint);

        let same = Arc::clone(&endpoint).with_timeout(None);
        assert!(Arc::ptr_eq(&same, &endpoint_ref));

        let changed = Arc::clone(&endpoint).with_timeout(Some(Duration::from_millis(250)));
        assert!(!Arc::ptr_eq(&changed, &endpoint_ref));
        assert_eq!(changed.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn wildcard_expands_per_interface() {
        let endpoint = LoopbackEndpoint::stream(WILDCARD, 1);
        let expanded = endpoint.expand();

        let names: Vec<String> = expanded.iter().map(|e| e.to_string()).collect();
        assert_eq!(names, vec!["loopback -h lo0", "loopback -h lo1"]);
    }

    #[test]
    fn concrete_endpoint_expands_to_itself() {
        let endpoint: EndpointRef = LoopbackEndpoint::stream("lo0", 1);
        let expanded = Arc::clone(&endpoint).expand();

        assert_eq!(expanded.len(), 1);
        assert!(Arc::ptr_eq(&expanded[0], &endpoint));
    }

    #[test]
    fn resolution_counter_tracks_calls() {
        let endpoint = LoopbackEndpoint::stream("lo0", 3);
        assert_eq!(endpoint.resolutions(), 0);

        let connectors = endpoint.connectors().expect("resolve");
        assert_eq!(connectors.len(), 3);
        assert_eq!(endpoint.resolutions(), 1);
    }

    #[test]
    fn transceiver_echoes_written_bytes() {
        let endpoint = LoopbackEndpoint::dgram("lo0");
        let (transceiver, _) = endpoint.transceiver();
        let mut transceiver = transceiver.expect("datagram endpoint has a transceiver");

        assert_eq!(transceiver.write(b"ping").expect("write"), 4);
        let mut buf = [0u8; 8];
        assert_eq!(transceiver.read(&mut buf).expect("read"), 4);
        assert_eq!(&buf[..4], b"ping");
    }

    #[test]
    fn closed_transceiver_rejects_io() {
        let mut transceiver = LoopbackTransceiver::open("lo0");
        transceiver.close().expect("close");

        assert!(matches!(transceiver.write(b"x"), Err(TransportError::Closed)));
        let mut buf = [0u8; 1];
        assert!(matches!(transceiver.read(&mut buf), Err(TransportError::Closed)));
    }

    #[test]
    fn stream_endpoint_has_no_direct_transceiver() {
        let endpoint = LoopbackEndpoint::stream("lo0", 1);
        let (transceiver, _) = endpoint.transceiver();
        assert!(transceiver.is_none());
    }

    #[test]
    fn equivalence_ignores_configuration() {
        let a: EndpointRef = LoopbackEndpoint::stream("lo0", 1);
        let b = Arc::clone(&a).with_timeout(Some(Duration::from_millis(100)));

        assert!(a.equivalent(b.as_ref()));
        assert_ne!(a.compare(b.as_ref()), Ordering::Equal);
    }
}
