//! Wallet client: owns connection state and performs connect, disconnect
//! and session restore.
//!
//! [`WalletClient`] is built once from a [`WalletConfig`] and the configured
//! connectors, then shared read-only. Per-interaction state lives in the
//! [`SessionStorage`] handed to each call, so the client never holds a mutable
//! copy of the connection.

use std::sync::Arc;

use serde::Serialize;

use crate::config::WalletConfig;
use crate::connector::Connector;
use crate::error::Error;
use crate::storage::{
    CookieStorage, MemoryStorage, SessionStorage, Storage, StorageKind, StoredConnection,
};

/// An established connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Connected account address.
    pub address: String,
    /// Chain the account is connected on.
    pub chain_id: u64,
    /// Connector that established the connection.
    pub connector_id: String,
}

/// Observable connection state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No account is connected.
    #[default]
    Disconnected,
    /// An account is connected.
    Connected(Connection),
}

impl ConnectionState {
    /// Whether an account is connected.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    /// Connected account address, if any.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Connected(connection) => Some(&connection.address),
            Self::Disconnected => None,
        }
    }
}

impl Serialize for ConnectionState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let connection = match self {
            Self::Connected(connection) => Some(connection),
            Self::Disconnected => None,
        };
        let mut state = serializer.serialize_struct("ConnectionState", 4)?;
        state.serialize_field("isConnected", &self.is_connected())?;
        state.serialize_field("address", &connection.map(|c| &c.address))?;
        state.serialize_field("chainId", &connection.map(|c| c.chain_id))?;
        state.serialize_field("connectorId", &connection.map(|c| &c.connector_id))?;
        state.end()
    }
}

/// Public summary of a connector.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectorInfo<'a> {
    /// Connector id.
    pub id: &'a str,
    /// Display name.
    pub name: &'a str,
}

/// Public summary of the client configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ClientInfo<'a> {
    /// Wallet configuration.
    #[serde(flatten)]
    pub config: &'a WalletConfig,
    /// Connectors in the order they are offered.
    pub connectors: Vec<ConnectorInfo<'a>>,
}

/// Connection manager shared by every request.
#[derive(Debug)]
pub struct WalletClient {
    config: Arc<WalletConfig>,
    connectors: Vec<Arc<dyn Connector>>,
    memory: MemoryStorage,
}

impl WalletClient {
    /// Creates a client over `config` offering `connectors` in order.
    #[must_use]
    pub fn new(config: WalletConfig, connectors: Vec<Arc<dyn Connector>>) -> Self {
        Self {
            config: Arc::new(config),
            connectors,
            memory: MemoryStorage::default(),
        }
    }

    /// Configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// Available connectors, in the order they are offered.
    #[must_use]
    pub fn connectors(&self) -> &[Arc<dyn Connector>] {
        &self.connectors
    }

    /// Finds a connector by id.
    #[must_use]
    pub fn connector(&self, id: &str) -> Option<&Arc<dyn Connector>> {
        self.connectors.iter().find(|connector| connector.id() == id)
    }

    /// Public summary of configuration and connectors.
    #[must_use]
    pub fn info(&self) -> ClientInfo<'_> {
        ClientInfo {
            config: &self.config,
            connectors: self
                .connectors
                .iter()
                .map(|c| ConnectorInfo {
                    id: c.id(),
                    name: c.name(),
                })
                .collect(),
        }
    }

    /// Opens the session storage for one interaction.
    ///
    /// `cookies` are the request's `Cookie` header values; they are ignored
    /// when memory storage is configured.
    pub fn session<'a>(&self, cookies: impl IntoIterator<Item = &'a str>) -> SessionStorage {
        match self.config.storage().kind {
            StorageKind::Cookie => SessionStorage::Cookie(CookieStorage::from_headers(cookies)),
            StorageKind::Memory => SessionStorage::Memory(self.memory.clone()),
        }
    }

    /// Restores the connection state from `storage`.
    ///
    /// A stored session that is malformed, names an unknown connector or an
    /// unconfigured chain, or is no longer authorized restores as
    /// [`ConnectionState::Disconnected`] and is removed.
    pub fn state(&self, storage: &mut impl Storage) -> ConnectionState {
        let key = self.config.storage().item_key();
        let stored = match StoredConnection::load(storage, &key) {
            Ok(Some(stored)) => stored,
            Ok(None) => return ConnectionState::Disconnected,
            Err(error) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(%error, "dropping unreadable session");
                #[cfg(not(feature = "telemetry"))]
                let _ = error;
                storage.remove_item(&key);
                return ConnectionState::Disconnected;
            }
        };

        let restorable = self.config.chain(stored.chain_id).is_some()
            && self
                .connector(&stored.connector_id)
                .is_some_and(|connector| connector.is_authorized(&stored.address));
        if !restorable {
            #[cfg(feature = "telemetry")]
            tracing::info!(
                connector = %stored.connector_id,
                chain_id = stored.chain_id,
                "dropping stale session"
            );
            storage.remove_item(&key);
            return ConnectionState::Disconnected;
        }

        ConnectionState::Connected(Connection {
            address: stored.address,
            chain_id: stored.chain_id,
            connector_id: stored.connector_id,
        })
    }

    /// Connects through `connector` on the primary chain and persists the session.
    ///
    /// Returns the current state unchanged if already connected.
    ///
    /// # Errors
    ///
    /// Returns an error if the connector rejects the request or the session
    /// cannot be stored.
    pub async fn connect(
        &self,
        connector: &dyn Connector,
        storage: &mut impl Storage,
    ) -> Result<ConnectionState, Error> {
        let current = self.state(storage);
        if current.is_connected() {
            return Ok(current);
        }

        let chain_id = self.config.primary_chain().id;
        let address = connector.connect(chain_id).await?;
        let stored = StoredConnection {
            connector_id: connector.id().to_owned(),
            address,
            chain_id,
        };
        stored.save(storage, &self.config.storage().item_key())?;

        #[cfg(feature = "telemetry")]
        tracing::info!(
            connector = %stored.connector_id,
            address = %stored.address,
            chain_id,
            "wallet connected"
        );

        Ok(ConnectionState::Connected(Connection {
            address: stored.address,
            chain_id: stored.chain_id,
            connector_id: stored.connector_id,
        }))
    }

    /// Ends the current connection and clears the stored session.
    ///
    /// The session is cleared even if the connector fails to disconnect.
    pub async fn disconnect(&self, storage: &mut impl Storage) -> ConnectionState {
        let current = self.state(storage);
        storage.remove_item(&self.config.storage().item_key());

        if let ConnectionState::Connected(connection) = current
            && let Some(connector) = self.connector(&connection.connector_id)
        {
            if let Err(error) = connector.disconnect().await {
                #[cfg(feature = "telemetry")]
                tracing::warn!(%error, connector = %connection.connector_id, "connector disconnect failed");
                #[cfg(not(feature = "telemetry"))]
                let _ = error;
            }
            #[cfg(feature = "telemetry")]
            tracing::info!(address = %connection.address, "wallet disconnected");
        }

        ConnectionState::Disconnected
    }
}
