//! Pass-through transport decorators.
//!
//! These exist for one reason: transport values produced by a decorated
//! endpoint must stay decorated as they flow through the system.
//! [`FaultConnector`] and [`FaultAcceptor`] re-wrap the transceivers they
//! hand out; [`FaultTransceiver`] forwards byte I/O unchanged. None of them
//! inject faults or hold state of their own.

use std::fmt;

use sigil_core::{
    error::TransportError,
    transport::{Acceptor, Connector, Transceiver},
};

/// Connector decorator; wraps every channel it opens.
#[derive(Debug)]
pub struct FaultConnector {
    inner: Box<dyn Connector>,
}

impl FaultConnector {
    /// Decorate `inner`.
    #[must_use]
    pub fn wrap(inner: Box<dyn Connector>) -> Box<dyn Connector> {
        Box::new(Self { inner })
    }
}

impl Connector for FaultConnector {
    fn connect(&self) -> Result<Box<dyn Transceiver>, TransportError> {
        Ok(FaultTransceiver::wrap(self.inner.connect()?))
    }
}

impl fmt::Display for FaultConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

/// Acceptor decorator; wraps every channel it accepts.
#[derive(Debug)]
pub struct FaultAcceptor {
    inner: Box<dyn Acceptor>,
}

impl FaultAcceptor {
    /// Decorate `inner`.
    #[must_use]
    pub fn wrap(inner: Box<dyn Acceptor>) -> Box<dyn Acceptor> {
        Box::new(Self { inner })
    }
}

impl Acceptor for FaultAcceptor {
    fn accept(&mut self) -> Result<Box<dyn Transceiver>, TransportError> {
        Ok(FaultTransceiver::wrap(self.inner.accept()?))
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.inner.close()
    }
}

impl fmt::Display for FaultAcceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

/// Transceiver decorator; plain pass-through.
#[derive(Debug)]
pub struct FaultTransceiver {
    inner: Box<dyn Transceiver>,
}

impl FaultTransceiver {
    /// Decorate `inner`.
    #[must_use]
    pub fn wrap(inner: Box<dyn Transceiver>) -> Box<dyn Transceiver> {
        Box::new(Self { inner })
    }
}

impl Transceiver for FaultTransceiver {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.inner.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        self.inner.write(buf)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.inner.close()
    }
}

impl fmt::Display for FaultTransceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}
