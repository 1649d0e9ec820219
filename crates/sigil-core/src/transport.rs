//! Transport primitive contracts.
//!
//! A [`Connector`] opens an outbound byte channel to one resolved address,
//! an [`Acceptor`] listens for inbound channels, and a [`Transceiver`] is
//! the bidirectional channel itself. Endpoints are the sole producers of all
//! three; see [`crate::endpoint::Endpoint`].

use std::fmt;

use crate::error::TransportError;

/// A bidirectional raw-byte transport channel.
pub trait Transceiver: fmt::Debug + fmt::Display + Send {
    /// Read available bytes into `buf`, returning the number read.
    ///
    /// Returns `Ok(0)` when no bytes are pending; blocking semantics are an
    /// implementation concern.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Write bytes from `buf`, returning the number written.
    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError>;

    /// Close the channel. Subsequent reads and writes fail with
    /// [`TransportError::Closed`].
    fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens an outbound transport channel to a specific resolved address.
pub trait Connector: fmt::Debug + fmt::Display + Send + Sync {
    /// Open a channel to the connector's address.
    fn connect(&self) -> Result<Box<dyn Transceiver>, TransportError>;
}

/// Listens for and accepts inbound transport channels.
pub trait Acceptor: fmt::Debug + fmt::Display + Send {
    /// Accept the next inbound channel.
    fn accept(&mut self) -> Result<Box<dyn Transceiver>, TransportError>;

    /// Stop accepting and release the listening resource.
    fn close(&mut self) -> Result<(), TransportError>;
}
