//! Fault-injection harness for the sigil transport layer.
//!
//! Wrap any [`sigil_core::Endpoint`] in a [`FaultEndpoint`] and it behaves
//! identically to the real thing — same ordering, equality, hashing, and
//! wire shape — until the shared [`FaultConfig`] arms a fault, at which
//! point connector resolution fails deterministically without the wrapped
//! endpoint ever being reached. This makes the failure paths of the
//! connection-establishment machinery reproducible in plain unit tests.
//!
//! ## Architecture
//!
//! ```text
//! sigil-harness
//!   ├─ FaultConfig           (shared fault store, one per test)
//!   ├─ FaultEndpoint         (endpoint decorator, the interposition point)
//!   ├─ FaultConnector        (pass-through, keeps channels decorated)
//!   ├─ FaultAcceptor         (pass-through, keeps channels decorated)
//!   ├─ FaultTransceiver      (pass-through byte channel)
//!   ├─ FaultEndpointFactory  (wire decode for the decorated family)
//!   ├─ LoopbackEndpoint      (in-memory endpoint the tests decorate)
//!   └─ ServerRegistry        (per-test server factory)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod endpoint;
mod loopback;
mod registry;
mod transport;

pub use config::FaultConfig;
pub use endpoint::{FAULT_TYPE_BASE, FaultEndpoint, FaultEndpointFactory};
pub use loopback::{
    LOOPBACK_TYPE, LoopbackAcceptor, LoopbackConnector, LoopbackEndpoint, LoopbackFactory,
    LoopbackTransceiver,
};
pub use registry::{RegistryError, ServerId, ServerRegistry};
pub use transport::{FaultAcceptor, FaultConnector, FaultTransceiver};
