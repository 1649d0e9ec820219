//! Fuzz target for the endpoint wire decode path
//!
//! # Strategy
//!
//! - Arbitrary bytes through `FactoryRegistry::decode` with the loopback and
//!   fault-decorated factories registered
//! - Truncated tags, truncated bodies, oversized string lengths, invalid
//!   UTF-8, out-of-range bool bytes, mismatched embedded tags
//!
//! # Invariants
//!
//! - Decode NEVER panics, whatever the input
//! - A successful decode re-encodes to bytes that decode to an equal
//!   endpoint with an equal hash

#![no_main]

use std::sync::Arc;

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use sigil_core::{Endpoint, EndpointFactory, EndpointKey, FactoryRegistry};
use sigil_harness::{FaultConfig, FaultEndpointFactory, LoopbackFactory};

fuzz_target!(|data: &[u8]| {
    let config = Arc::new(FaultConfig::new());
    let mut registry = FactoryRegistry::new();
    let loopback: Arc<dyn EndpointFactory> = Arc::new(LoopbackFactory);
    registry.register(Arc::clone(&loopback));
    registry.register(Arc::new(FaultEndpointFactory::new(loopback, config)));

    let mut bytes = Bytes::copy_from_slice(data);
    if let Ok(endpoint) = registry.decode(&mut bytes) {
        let mut encoded = Vec::new();
        endpoint.encode(&mut encoded);

        let mut round = Bytes::from(encoded);
        let decoded = registry.decode(&mut round).expect("re-decode of a valid encoding");

        assert_eq!(EndpointKey(Arc::clone(&endpoint)), EndpointKey(Arc::clone(&decoded)));
        assert_eq!(endpoint.endpoint_hash(), decoded.endpoint_hash());
    }
});
