//! Connector with fixed accounts.

use super::{Connector, ConnectorFuture};
use crate::error::Error;

/// Hands out a fixed account list. Can be told to reject every request,
/// the way a user dismissing the wallet prompt would.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    accounts: Vec<String>,
    fail_connect: bool,
}

impl MockConnector {
    /// Creates a connector granting `accounts[0]` on connect.
    #[must_use]
    pub const fn new(accounts: Vec<String>) -> Self {
        Self {
            accounts,
            fail_connect: false,
        }
    }

    /// Rejects every connection request when `fail` is set.
    #[must_use]
    pub fn failing(mut self, fail: bool) -> Self {
        self.fail_connect = fail;
        self
    }
}

impl Connector for MockConnector {
    fn id(&self) -> &'static str {
        "mock"
    }

    fn name(&self) -> &'static str {
        "Mock Connector"
    }

    fn connect(&self, _chain_id: u64) -> ConnectorFuture<'_, String> {
        Box::pin(async move {
            if self.fail_connect {
                return Err(Error::connector("user rejected the request"));
            }
            self.accounts
                .first()
                .cloned()
                .ok_or_else(|| Error::connector("mock connector has no accounts"))
        })
    }

    fn disconnect(&self) -> ConnectorFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn is_authorized(&self, address: &str) -> bool {
        !self.fail_connect
            && self
                .accounts
                .iter()
                .any(|account| account.eq_ignore_ascii_case(address))
    }
}
