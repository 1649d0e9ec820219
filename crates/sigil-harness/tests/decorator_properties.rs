//! Property-based tests over the decorator's structural contracts.
//!
//! These verify, across randomly configured endpoints, that equality,
//! ordering, and hashing stay mutually consistent through the decorator and
//! that the wire encoding round-trips.

use std::{
    cmp::Ordering,
    hash::{DefaultHasher, Hash, Hasher},
    sync::Arc,
    time::Duration,
};

use bytes::Bytes;
use proptest::prelude::*;
use sigil_core::{Endpoint, EndpointFactory, EndpointKey, EndpointRef, FactoryRegistry};
use sigil_harness::{
    FAULT_TYPE_BASE, FaultConfig, FaultEndpoint, FaultEndpointFactory, LoopbackEndpoint,
    LoopbackFactory,
};

#[derive(Debug, Clone)]
struct EndpointParams {
    name: String,
    connection_id: String,
    timeout_ms: Option<u64>,
    compress: bool,
    connectors: usize,
}

fn params_strategy() -> impl Strategy<Value = EndpointParams> {
    ("[a-z]{1,6}", "[a-z]{0,4}", proptest::option::of(0u64..10_000), any::<bool>(), 0usize..4)
        .prop_map(|(name, connection_id, timeout_ms, compress, connectors)| EndpointParams {
            name,
            connection_id,
            timeout_ms,
            compress,
            connectors,
        })
}

fn build(params: &EndpointParams, config: &Arc<FaultConfig>) -> EndpointRef {
    FaultEndpoint::wrap(LoopbackEndpoint::stream(&params.name, params.connectors), Arc::clone(config))
        .with_timeout(params.timeout_ms.map(Duration::from_millis))
        .with_compress(params.compress)
        .with_connection_id(&params.connection_id)
}

fn hash_of(key: &EndpointKey) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    #[test]
    fn prop_type_tag_is_offset_from_wrapped(params in params_strategy()) {
        let raw: EndpointRef = LoopbackEndpoint::stream(&params.name, params.connectors);
        let raw_tag = raw.type_tag();
        let endpoint = FaultEndpoint::wrap(raw, Arc::new(FaultConfig::new()));

        prop_assert_eq!(endpoint.type_tag(), FAULT_TYPE_BASE + raw_tag);
    }

    #[test]
    fn prop_equality_ordering_and_hash_agree(a in params_strategy(), b in params_strategy()) {
        let config = Arc::new(FaultConfig::new());
        let da = build(&a, &config);
        let db = build(&b, &config);

        let ordering = da.compare(db.as_ref());
        prop_assert_eq!(ordering, db.compare(da.as_ref()).reverse());

        let keys_equal = EndpointKey(Arc::clone(&da)) == EndpointKey(Arc::clone(&db));
        prop_assert_eq!(keys_equal, ordering == Ordering::Equal);

        if ordering == Ordering::Equal {
            prop_assert_eq!(da.endpoint_hash(), db.endpoint_hash());
            prop_assert_eq!(hash_of(&EndpointKey(da)), hash_of(&EndpointKey(db)));
        }
    }

    #[test]
    fn prop_identically_configured_decorators_are_equal(params in params_strategy()) {
        let config = Arc::new(FaultConfig::new());
        let da = build(&params, &config);
        let db = build(&params, &config);

        prop_assert_eq!(da.compare(db.as_ref()), Ordering::Equal);
        prop_assert_eq!(da.endpoint_hash(), db.endpoint_hash());
        prop_assert!(da.equivalent(db.as_ref()));
    }

    #[test]
    fn prop_mutators_are_idempotent(params in params_strategy(), ms in 0u64..5_000) {
        let config = Arc::new(FaultConfig::new());
        let endpoint = build(&params, &config);

        let once = Arc::clone(&endpoint).with_timeout(Some(Duration::from_millis(ms)));
        let twice = Arc::clone(&once).with_timeout(Some(Duration::from_millis(ms)));

        prop_assert!(Arc::ptr_eq(&once, &twice));
        prop_assert_eq!(once.compare(twice.as_ref()), Ordering::Equal);
    }

    #[test]
    fn prop_wire_round_trip_preserves_equality(params in params_strategy()) {
        let config = Arc::new(FaultConfig::new());
        let endpoint = build(&params, &config);

        let mut registry = FactoryRegistry::new();
        let loopback: Arc<dyn EndpointFactory> = Arc::new(LoopbackFactory);
        registry.register(Arc::clone(&loopback));
        registry.register(Arc::new(FaultEndpointFactory::new(loopback, Arc::clone(&config))));

        let mut encoded = Vec::new();
        endpoint.encode(&mut encoded);

        let mut bytes = Bytes::from(encoded);
        let decoded = registry.decode(&mut bytes).expect("decode of a fresh encoding");

        prop_assert_eq!(decoded.compare(endpoint.as_ref()), Ordering::Equal);
        prop_assert_eq!(decoded.endpoint_hash(), endpoint.endpoint_hash());
        prop_assert_eq!(bytes.len(), 0, "decode must consume the full encoding");
    }
}
