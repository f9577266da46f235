//! Connector for an account held as a local private key.

use alloy_signer_local::PrivateKeySigner;

use super::{Connector, ConnectorFuture};
use crate::error::Error;

/// Account backed by a local secp256k1 key (e.g. an Anvil dev account).
///
/// Only the derived address is kept; the key is dropped after parsing.
#[derive(Debug, Clone)]
pub struct LocalConnector {
    address: String,
}

impl LocalConnector {
    /// Parses a hex private key (0x prefix optional).
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a valid secp256k1 secret.
    pub fn from_private_key(private_key: &str) -> Result<Self, Error> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| Error::connector_with("failed to parse local private key", e))?;
        Ok(Self {
            address: signer.address().to_string(),
        })
    }

    /// Checksummed address of the account.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Connector for LocalConnector {
    fn id(&self) -> &'static str {
        "local"
    }

    fn name(&self) -> &'static str {
        "Local Account"
    }

    fn connect(&self, _chain_id: u64) -> ConnectorFuture<'_, String> {
        Box::pin(async move { Ok(self.address().to_owned()) })
    }

    fn disconnect(&self) -> ConnectorFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn is_authorized(&self, address: &str) -> bool {
        self.address().eq_ignore_ascii_case(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // First default Anvil account.
    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ANVIL_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[tokio::test]
    async fn derives_checksummed_address() {
        let connector = LocalConnector::from_private_key(ANVIL_KEY).expect("valid key");
        assert_eq!(connector.address(), ANVIL_ADDRESS);
        assert_eq!(connector.connect(31337).await.expect("connects"), ANVIL_ADDRESS);
        assert!(connector.is_authorized(&ANVIL_ADDRESS.to_lowercase()));
        assert!(!connector.is_authorized("0x0000000000000000000000000000000000000000"));
    }

    #[test]
    fn accepts_unprefixed_keys() {
        let connector =
            LocalConnector::from_private_key(ANVIL_KEY.trim_start_matches("0x")).expect("valid");
        assert_eq!(connector.address(), ANVIL_ADDRESS);
    }
}
