//! Endpoint contract of the invocation framework.
//!
//! An endpoint is an immutable address + transport-family descriptor. It is
//! the sole producer of connectors, acceptors, and transceivers, and it is
//! the unit the connection-establishment machinery sorts, deduplicates, and
//! caches. Endpoints are shared as [`EndpointRef`] handles; "same instance"
//! means [`std::sync::Arc::ptr_eq`] on the handle.
//!
//! # Invariants
//!
//! - Immutability: every mutator returns a new endpoint value; when the
//!   requested state equals the current state, implementations return the
//!   same instance so identity-based caches keep working.
//! - Ordering consistency: [`Endpoint::compare`], [`Endpoint::endpoint_hash`]
//!   and equality (compare == `Equal`) agree with each other; endpoints of a
//!   different family order by type tag alone and never error.

use std::{
    any::Any,
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    error::TransportError,
    transport::{Acceptor, Connector, Transceiver},
};

/// Transport-family discriminator carried in every endpoint encoding.
pub type TypeTag = u16;

/// Shared handle to an immutable endpoint value.
pub type EndpointRef = Arc<dyn Endpoint>;

/// Address + transport-family descriptor.
///
/// `Arc<Self>` receivers express "returns a new immutable endpoint value,
/// possibly the same instance"; callers clone the handle when they want to
/// keep the original.
#[async_trait]
pub trait Endpoint: fmt::Debug + fmt::Display + Send + Sync {
    /// Transport-family type tag.
    fn type_tag(&self) -> TypeTag;

    /// Configured connection timeout; `None` means no timeout.
    fn timeout(&self) -> Option<Duration>;

    /// Return an endpoint with the given timeout, provided timeouts are
    /// supported. Returns the same instance when the value is unchanged or
    /// unsupported.
    fn with_timeout(self: Arc<Self>, timeout: Option<Duration>) -> EndpointRef;

    /// Return an endpoint with the given connection id. Returns the same
    /// instance when the id is unchanged.
    fn with_connection_id(self: Arc<Self>, connection_id: &str) -> EndpointRef;

    /// Whether payload compression is enabled.
    fn compress(&self) -> bool;

    /// Return an endpoint with the given compression flag, provided
    /// compression is supported. Returns the same instance when unchanged.
    fn with_compress(self: Arc<Self>, compress: bool) -> EndpointRef;

    /// Whether the endpoint is datagram-based.
    fn datagram(&self) -> bool;

    /// Whether the transport is secured.
    fn secure(&self) -> bool;

    /// Whether the endpoint's type is unknown to this process.
    fn unknown(&self) -> bool;

    /// Resolve connectors for this endpoint, one per resolved address, or an
    /// empty list when no connector is available.
    fn connectors(&self) -> Result<Vec<Box<dyn Connector>>, TransportError>;

    /// Asynchronous twin of [`Endpoint::connectors`].
    ///
    /// The returned future resolves exactly once, with either the full
    /// connector list or a single failure, and may complete on a different
    /// task than the caller.
    async fn connectors_async(&self) -> Result<Vec<Box<dyn Connector>>, TransportError>;

    /// Create a server-side acceptor for the named adapter.
    ///
    /// Also returns the new effective endpoint, which may differ from this
    /// one, for example when a dynamic port is assigned.
    fn acceptor(
        self: Arc<Self>,
        adapter_name: &str,
    ) -> Result<(Box<dyn Acceptor>, EndpointRef), TransportError>;

    /// Create a server-side transceiver, or `None` when channels can only be
    /// obtained through an acceptor. Also returns the effective endpoint.
    fn transceiver(self: Arc<Self>) -> (Option<Box<dyn Transceiver>>, EndpointRef);

    /// Expand a wildcard endpoint into one endpoint per local interface.
    /// Non-wildcard endpoints expand to themselves.
    fn expand(self: Arc<Self>) -> Vec<EndpointRef>;

    /// Whether `other` names the same logical endpoint for
    /// connection-sharing purposes. Weaker than equality under
    /// [`Endpoint::compare`]: configuration such as timeouts is ignored.
    fn equivalent(&self, other: &dyn Endpoint) -> bool;

    /// Total order over endpoints, used for sorting and deduplication.
    ///
    /// Endpoints of a different family order by type tag alone; families
    /// never share a tag, so the order stays total.
    fn compare(&self, other: &dyn Endpoint) -> Ordering;

    /// Hash consistent with [`Endpoint::compare`]: endpoints that compare
    /// equal hash equal.
    fn endpoint_hash(&self) -> u64;

    /// Append the endpoint's complete wire encoding: leading big-endian type
    /// tag, then the family-specific body.
    fn encode(&self, buf: &mut Vec<u8>);

    /// View for same-family downcasts in comparison operations.
    fn as_any(&self) -> &dyn Any;
}

/// Ordering/equality/hash adapter over an [`EndpointRef`].
///
/// `dyn Endpoint` cannot implement the std comparison traits itself, so the
/// deduplication and connection-caching maps key on this wrapper instead.
#[derive(Clone)]
pub struct EndpointKey(pub EndpointRef);

impl fmt::Debug for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EndpointKey({})", self.0)
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl PartialEq for EndpointKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.compare(other.0.as_ref()) == Ordering::Equal
    }
}

impl Eq for EndpointKey {}

impl PartialOrd for EndpointKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EndpointKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.compare(other.0.as_ref())
    }
}

impl Hash for EndpointKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.endpoint_hash());
    }
}
