//! Endpoint decode factories.
//!
//! Encoded endpoints carry a leading type tag; the [`FactoryRegistry`] reads
//! the tag, finds the [`EndpointFactory`] registered for that family, and
//! hands it the remainder of the encoding.

use std::{fmt, sync::Arc};

use bytes::Bytes;

use crate::{
    endpoint::{EndpointRef, TypeTag},
    error::TransportError,
    wire,
};

/// Decodes the body of one endpoint family's wire encoding.
pub trait EndpointFactory: Send + Sync {
    /// Tag of the family this factory decodes.
    fn type_tag(&self) -> TypeTag;

    /// Decode an endpoint body. The dispatch tag has already been consumed
    /// by the caller.
    fn decode(&self, buf: &mut Bytes) -> Result<EndpointRef, TransportError>;
}

/// Registry mapping type tags to decode factories.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: Vec<Arc<dyn EndpointFactory>>,
}

impl FactoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory. The first registration for a tag wins.
    pub fn register(&mut self, factory: Arc<dyn EndpointFactory>) {
        self.factories.push(factory);
    }

    /// Find the factory registered for `tag`.
    #[must_use]
    pub fn find(&self, tag: TypeTag) -> Option<&Arc<dyn EndpointFactory>> {
        self.factories.iter().find(|factory| factory.type_tag() == tag)
    }

    /// Decode one complete endpoint encoding: leading big-endian tag, then
    /// the family body via the matching factory.
    pub fn decode(&self, buf: &mut Bytes) -> Result<EndpointRef, TransportError> {
        let tag = wire::get_u16(buf)?;
        let factory = self.find(tag).ok_or(TransportError::UnknownTypeTag { tag })?;
        factory.decode(buf)
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<TypeTag> = self.factories.iter().map(|factory| factory.type_tag()).collect();
        f.debug_struct("FactoryRegistry").field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_of_unregistered_tag_errors() {
        let registry = FactoryRegistry::new();
        let mut bytes = Bytes::from_static(&[0x00, 0x07]);

        let err = registry.decode(&mut bytes).expect_err("no factory for tag 7");
        assert!(matches!(err, TransportError::UnknownTypeTag { tag: 7 }));
    }

    #[test]
    fn decode_of_empty_buffer_is_malformed() {
        let registry = FactoryRegistry::new();
        let mut bytes = Bytes::new();

        let err = registry.decode(&mut bytes).expect_err("no tag to read");
        assert!(matches!(err, TransportError::MalformedWire { .. }));
    }
}
