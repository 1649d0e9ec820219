//! Per-test server factory.
//!
//! Each test server is a decorated loopback endpoint with its adapter's
//! acceptor open. The registry tracks live servers by identity and refuses
//! to shut down while any remain, which catches tests that leak servers.

use std::{collections::HashMap, sync::Arc, time::Duration};

use sigil_core::{
    endpoint::{Endpoint, EndpointRef},
    error::TransportError,
    transport::Acceptor,
};
use thiserror::Error;

use crate::{config::FaultConfig, endpoint::FaultEndpoint, loopback::LoopbackEndpoint};

/// Handle identifying a live test server.
pub type ServerId = u64;

/// Errors from server registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Handle does not name a live server.
    #[error("unknown server: {0}")]
    UnknownServer(ServerId),

    /// Shutdown requested while servers are still live.
    #[error("{count} server(s) still live at shutdown")]
    ActiveServers {
        /// Number of servers still tracked.
        count: usize,
    },

    /// A property value could not be parsed.
    #[error("invalid property {key}: {value}")]
    InvalidProperty {
        /// Property key.
        key: String,
        /// Offending value.
        value: String,
    },

    /// Transport failure while spinning the server up or down.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One live test server.
struct TestServer {
    adapter_name: String,
    endpoint: EndpointRef,
    acceptor: Box<dyn Acceptor>,
}

/// Spins up and tracks test servers.
///
/// Every server's endpoint is decorated against the registry's shared
/// [`FaultConfig`], so arming a fault affects all of them at once.
pub struct ServerRegistry {
    config: Arc<FaultConfig>,
    servers: HashMap<ServerId, TestServer>,
    next_id: ServerId,
}

impl ServerRegistry {
    /// Registry whose servers consult `config` for injected faults.
    #[must_use]
    pub fn new(config: Arc<FaultConfig>) -> Self {
        Self { config, servers: HashMap::new(), next_id: 0 }
    }

    /// Number of live servers.
    #[must_use]
    pub fn live_servers(&self) -> usize {
        self.servers.len()
    }

    /// Spin up a server described by a property map and track it.
    ///
    /// Recognized properties: `endpoint-name`, `adapter-name`, `timeout-ms`,
    /// `compress`, `connection-id`, `connectors`. Unrecognized keys are
    /// ignored so suites can carry their own settings in the same map.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidProperty`] when a recognized value
    /// fails to parse, or [`RegistryError::Transport`] when the adapter's
    /// acceptor cannot be opened.
    pub fn create_server(
        &mut self,
        properties: &HashMap<String, String>,
    ) -> Result<ServerId, RegistryError> {
        let name = properties.get("endpoint-name").map_or("lo0", String::as_str);
        let adapter_name = properties.get("adapter-name").map_or("TestAdapter", String::as_str);
        let connectors = parse::<usize>(properties, "connectors")?.unwrap_or(1);

        let mut endpoint =
            FaultEndpoint::wrap(LoopbackEndpoint::stream(name, connectors), Arc::clone(&self.config));
        if let Some(ms) = parse::<u64>(properties, "timeout-ms")? {
            endpoint = endpoint.with_timeout(Some(Duration::from_millis(ms)));
        }
        if let Some(compress) = parse::<bool>(properties, "compress")? {
            endpoint = endpoint.with_compress(compress);
        }
        if let Some(connection_id) = properties.get("connection-id") {
            endpoint = endpoint.with_connection_id(connection_id);
        }

        let (acceptor, effective) = endpoint.acceptor(adapter_name)?;

        let id = self.next_id;
        self.next_id += 1;
        tracing::info!(id, adapter = adapter_name, endpoint = %effective, "test server up");
        self.servers.insert(
            id,
            TestServer { adapter_name: adapter_name.to_string(), endpoint: effective, acceptor },
        );
        Ok(id)
    }

    /// Effective endpoint of a live server.
    pub fn endpoint(&self, id: ServerId) -> Result<&EndpointRef, RegistryError> {
        self.servers.get(&id).map(|server| &server.endpoint).ok_or(RegistryError::UnknownServer(id))
    }

    /// Tear down a live server.
    pub fn destroy_server(&mut self, id: ServerId) -> Result<(), RegistryError> {
        let mut server = self.servers.remove(&id).ok_or(RegistryError::UnknownServer(id))?;
        server.acceptor.close()?;
        tracing::info!(id, adapter = %server.adapter_name, "test server down");
        Ok(())
    }

    /// Shut the registry down.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ActiveServers`] while any server is live.
    pub fn shutdown(self) -> Result<(), RegistryError> {
        if !self.servers.is_empty() {
            return Err(RegistryError::ActiveServers { count: self.servers.len() });
        }
        tracing::info!("server registry shut down");
        Ok(())
    }
}

impl std::fmt::Debug for ServerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerRegistry")
            .field("live_servers", &self.servers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

fn parse<T: std::str::FromStr>(
    properties: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, RegistryError> {
    properties
        .get(key)
        .map(|value| {
            value.parse().map_err(|_| RegistryError::InvalidProperty {
                key: key.to_string(),
                value: value.clone(),
            })
        })
        .transpose()
}
