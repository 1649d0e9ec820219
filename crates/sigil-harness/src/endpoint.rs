//! Fault-injecting endpoint decorator.
//!
//! [`FaultEndpoint`] wraps a real endpoint and interposes itself
//! transparently: callers see the same comparison/equality/hash contract and
//! the same marshaling shape, but connector resolution consults a shared
//! [`FaultConfig`] before the wrapped endpoint is ever involved, and every
//! endpoint or transport value flowing back out is re-wrapped so decoration
//! is never lost.
//!
//! # Invariants
//!
//! - Identity delegates to the wrapped endpoint: two decorators are equal
//!   iff their wrapped endpoints are, and they hash alike.
//! - The reported type tag is `FAULT_TYPE_BASE + wrapped tag`, keeping the
//!   decorated family clear of real transport tags.
//! - Mutators return the same decorator instance when the wrapped endpoint
//!   reports no change, so identity-based endpoint caches keep working.

use std::{any::Any, cmp::Ordering, fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use sigil_core::{
    endpoint::{Endpoint, EndpointRef, TypeTag},
    error::TransportError,
    factory::EndpointFactory,
    transport::{Acceptor, Connector, Transceiver},
    wire,
};

use crate::{
    config::FaultConfig,
    transport::{FaultAcceptor, FaultConnector, FaultTransceiver},
};

/// Tag offset reserved for the fault-decorated transport family.
pub const FAULT_TYPE_BASE: TypeTag = 100;

/// Endpoint decorator that injects configured faults into connector
/// resolution.
pub struct FaultEndpoint {
    inner: EndpointRef,
    config: Arc<FaultConfig>,
}

impl FaultEndpoint {
    /// Wrap `inner`, consulting `config` on every connector resolution.
    pub fn wrap(inner: EndpointRef, config: Arc<FaultConfig>) -> EndpointRef {
        Arc::new(Self { inner, config })
    }

    /// Re-wrap an endpoint returned by the wrapped endpoint, preserving
    /// decorator identity when the underlying value is unchanged.
    fn rewrap(self: Arc<Self>, endpoint: EndpointRef) -> EndpointRef {
        if Arc::ptr_eq(&endpoint, &self.inner) {
            self
        } else {
            Arc::new(Self { inner: endpoint, config: Arc::clone(&self.config) })
        }
    }
}

#[async_trait]
impl Endpoint for FaultEndpoint {
    fn type_tag(&self) -> TypeTag {
        FAULT_TYPE_BASE + self.inner.type_tag()
    }

    fn timeout(&self) -> Option<Duration> {
        self.inner.timeout()
    }

    fn with_timeout(self: Arc<Self>, timeout: Option<Duration>) -> EndpointRef {
        let inner = Arc::clone(&self.inner).with_timeout(timeout);
        self.rewrap(inner)
    }

    fn with_connection_id(self: Arc<Self>, connection_id: &str) -> EndpointRef {
        let inner = Arc::clone(&self.inner).with_connection_id(connection_id);
        self.rewrap(inner)
    }

    fn compress(&self) -> bool {
        self.inner.compress()
    }

    fn with_compress(self: Arc<Self>, compress: bool) -> EndpointRef {
        let inner = Arc::clone(&self.inner).with_compress(compress);
        self.rewrap(inner)
    }

    fn datagram(&self) -> bool {
        self.inner.datagram()
    }

    fn secure(&self) -> bool {
        self.inner.secure()
    }

    fn unknown(&self) -> bool {
        self.inner.unknown()
    }

    fn connectors(&self) -> Result<Vec<Box<dyn Connector>>, TransportError> {
        self.config.check_connectors_fault()?;
        let connectors = self.inner.connectors()?;
        Ok(connectors.into_iter().map(FaultConnector::wrap).collect())
    }

    async fn connectors_async(&self) -> Result<Vec<Box<dyn Connector>>, TransportError> {
        // The check runs before the underlying resolution is started, so an
        // injected fault is reported without ever suspending.
        self.config.check_connectors_fault()?;
        let connectors = self.inner.connectors_async().await?;
        Ok(connectors.into_iter().map(FaultConnector::wrap).collect())
    }

    fn acceptor(
        self: Arc<Self>,
        adapter_name: &str,
    ) -> Result<(Box<dyn Acceptor>, EndpointRef), TransportError> {
        let (acceptor, effective) = Arc::clone(&self.inner).acceptor(adapter_name)?;
        // Acceptor creation always yields a fresh effective endpoint, even
        // when the underlying value is unchanged.
        let endpoint: EndpointRef =
            Arc::new(Self { inner: effective, config: Arc::clone(&self.config) });
        Ok((FaultAcceptor::wrap(acceptor), endpoint))
    }

    fn transceiver(self: Arc<Self>) -> (Option<Box<dyn Transceiver>>, EndpointRef) {
        let (transceiver, effective) = Arc::clone(&self.inner).transceiver();
        (transceiver.map(FaultTransceiver::wrap), self.rewrap(effective))
    }

    fn expand(self: Arc<Self>) -> Vec<EndpointRef> {
        Arc::clone(&self.inner)
            .expand()
            .into_iter()
            .map(|endpoint| Arc::clone(&self).rewrap(endpoint))
            .collect()
    }

    fn equivalent(&self, other: &dyn Endpoint) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|peer| self.inner.equivalent(peer.inner.as_ref()))
    }

    fn compare(&self, other: &dyn Endpoint) -> Ordering {
        let Some(peer) = other.as_any().downcast_ref::<Self>() else {
            // Families never share a tag, so tag order is total here.
            return self.type_tag().cmp(&other.type_tag());
        };
        if std::ptr::eq(self, peer) {
            return Ordering::Equal;
        }
        self.inner.compare(peer.inner.as_ref())
    }

    fn endpoint_hash(&self) -> u64 {
        self.inner.endpoint_hash()
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        wire::put_u16(buf, self.type_tag());
        self.inner.encode(buf);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for FaultEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fault-{}", self.inner)
    }
}

impl fmt::Debug for FaultEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultEndpoint")
            .field("type_tag", &self.type_tag())
            .field("inner", &self.inner)
            .finish()
    }
}

/// Decode factory for the fault-decorated endpoint family.
///
/// A decorated encoding embeds the wrapped endpoint's complete encoding,
/// leading tag included; decode verifies that tag against the inner factory
/// before delegating to it.
pub struct FaultEndpointFactory {
    inner: Arc<dyn EndpointFactory>,
    config: Arc<FaultConfig>,
}

impl FaultEndpointFactory {
    /// Factory decoding `FAULT_TYPE_BASE + inner tag` encodings; decoded
    /// endpoints consult `config`.
    pub fn new(inner: Arc<dyn EndpointFactory>, config: Arc<FaultConfig>) -> Self {
        Self { inner, config }
    }
}

impl EndpointFactory for FaultEndpointFactory {
    fn type_tag(&self) -> TypeTag {
        FAULT_TYPE_BASE + self.inner.type_tag()
    }

    fn decode(&self, buf: &mut Bytes) -> Result<EndpointRef, TransportError> {
        let tag = wire::get_u16(buf)?;
        if tag != self.inner.type_tag() {
            return Err(TransportError::UnknownTypeTag { tag });
        }
        let inner = self.inner.decode(buf)?;
        Ok(FaultEndpoint::wrap(inner, Arc::clone(&self.config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::{LOOPBACK_TYPE, LoopbackEndpoint};

    fn decorated() -> EndpointRef {
        FaultEndpoint::wrap(LoopbackEndpoint::stream("lo0", 1), Arc::new(FaultConfig::new()))
    }

    #[test]
    fn type_tag_is_offset_from_wrapped() {
        assert_eq!(decorated().type_tag(), FAULT_TYPE_BASE + LOOPBACK_TYPE);
    }

    #[test]
    fn display_prefixes_wrapped_form() {
        assert_eq!(decorated().to_string(), "fault-loopback -h lo0");
    }

    #[test]
    fn read_through_accessors_do_not_allocate_decorators() {
        let endpoint = decorated();
        assert_eq!(endpoint.timeout(), None);
        assert!(!endpoint.compress());
        assert!(!endpoint.datagram());
        assert!(!endpoint.secure());
        assert!(!endpoint.unknown());
    }

    #[test]
    fn self_comparison_short_circuits() {
        let endpoint = decorated();
        assert_eq!(endpoint.compare(endpoint.as_ref()), Ordering::Equal);
    }
}
