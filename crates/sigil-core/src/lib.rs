//! Sigil transport contracts.
//!
//! This crate defines the endpoint abstraction of the sigil invocation
//! framework: the value the connection-establishment machinery sorts,
//! deduplicates, caches, and marshals, plus the transport primitives it
//! produces.
//!
//! ## Architecture
//!
//! ```text
//! sigil-core
//!   ├─ Endpoint           (address + transport-family descriptor)
//!   ├─ Connector          (outbound channel producer)
//!   ├─ Acceptor           (inbound channel listener)
//!   ├─ Transceiver        (bidirectional byte channel)
//!   ├─ EndpointFactory    (wire decode, one per family)
//!   └─ wire               (bounds-checked codec helpers)
//! ```
//!
//! Transport implementations live in their own crates; the fault-injecting
//! test decorators live in `sigil-harness`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod endpoint;
pub mod error;
pub mod factory;
pub mod transport;
pub mod wire;

pub use endpoint::{Endpoint, EndpointKey, EndpointRef, TypeTag};
pub use error::{Fault, TransportError};
pub use factory::{EndpointFactory, FactoryRegistry};
pub use transport::{Acceptor, Connector, Transceiver};
