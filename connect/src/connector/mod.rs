//! Wallet connectors.
//!
//! A [`Connector`] is one wallet integration the client can connect through.
//! The wallet-side protocol is opaque here: a connector only hands back the
//! account address it was granted.
//!
//! - [`LocalConnector`]: an account backed by a local private key.
//! - [`MockConnector`]: fixed accounts, optionally rejecting every request.

mod local;
mod mock;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::Error;

pub use self::local::LocalConnector;
pub use self::mock::MockConnector;

/// Boxed future returned by connector requests.
pub type ConnectorFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>;

/// A wallet integration.
pub trait Connector: fmt::Debug + Send + Sync {
    /// Stable identifier persisted with the session.
    fn id(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    /// Requests account access on `chain_id` and returns the granted address.
    fn connect(&self, chain_id: u64) -> ConnectorFuture<'_, String>;

    /// Releases the connection.
    fn disconnect(&self) -> ConnectorFuture<'_, ()>;

    /// Whether a previously granted `address` is still usable without a new prompt.
    fn is_authorized(&self, address: &str) -> bool;
}

/// Connector entry of the TOML config.
///
/// ```toml
/// [[connectors]]
/// type = "local"
/// private_key = "$LOCAL_PRIVATE_KEY"
///
/// [[connectors]]
/// type = "mock"
/// accounts = ["0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"]
/// ```
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectorConfig {
    /// Account derived from a hex private key.
    Local {
        /// Hex-encoded secp256k1 private key (0x prefix optional).
        private_key: String,
    },
    /// Fixed accounts.
    Mock {
        /// Accounts handed out on connect; the first one is used.
        accounts: Vec<String>,
        /// Reject every connection request.
        #[serde(default)]
        fail_connect: bool,
    },
}

impl fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { .. } => f
                .debug_struct("Local")
                .field("private_key", &"<redacted>")
                .finish(),
            Self::Mock {
                accounts,
                fail_connect,
            } => f
                .debug_struct("Mock")
                .field("accounts", accounts)
                .field("fail_connect", fail_connect)
                .finish(),
        }
    }
}

impl ConnectorConfig {
    /// Builds the connector described by this entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a private key cannot be parsed.
    pub fn build(&self) -> Result<Arc<dyn Connector>, Error> {
        let connector: Arc<dyn Connector> = match self {
            Self::Local { private_key } => Arc::new(LocalConnector::from_private_key(private_key)?),
            Self::Mock {
                accounts,
                fail_connect,
            } => Arc::new(MockConnector::new(accounts.clone()).failing(*fail_connect)),
        };
        Ok(connector)
    }
}

/// Builds every configured connector, preserving order.
///
/// # Errors
///
/// Returns the first connector that fails to build.
pub fn build_connectors(configs: &[ConnectorConfig]) -> Result<Vec<Arc<dyn Connector>>, Error> {
    configs.iter().map(ConnectorConfig::build).collect()
}
