//! Transport error types.

use thiserror::Error;

/// A deterministic failure injected by a test fault configuration.
///
/// Faults are raised only from the connector-resolution path and are
/// surfaced to the immediate caller unchanged: never retried, never
/// translated, and never logged by the layer that raises them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("injected fault: {reason}")]
pub struct Fault {
    /// Description of the forced failure.
    reason: String,
}

impl Fault {
    /// Create a fault with the given description.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    /// Description of the forced failure.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Errors surfaced by endpoint and transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A fault injected by the test configuration.
    #[error(transparent)]
    Fault(#[from] Fault),

    /// An endpoint encoding could not be decoded.
    #[error("malformed endpoint encoding: {reason}")]
    MalformedWire {
        /// What was wrong with the bytes.
        reason: String,
    },

    /// No decode factory is registered for the type tag.
    #[error("unknown endpoint type tag: {tag}")]
    UnknownTypeTag {
        /// The unrecognized tag.
        tag: u16,
    },

    /// The transport primitive was used after it was closed.
    #[error("transport closed")]
    Closed,

    /// I/O failure from an underlying transport.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Shorthand for a [`TransportError::MalformedWire`] value.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedWire { reason: reason.into() }
    }

    /// Returns true if this error is an injected fault.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}
