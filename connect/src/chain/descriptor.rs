//! Chain descriptor records and CAIP-2 chain identifiers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// CAIP-2 namespace for EVM chains.
pub const EIP155_NAMESPACE: &str = "eip155";

/// RPC usage context every preset chain defines.
pub const DEFAULT_RPC_CONTEXT: &str = "default";

/// CAIP-2 chain identifier restricted to the `eip155` namespace
/// (e.g. `"eip155:31337"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(u64);

impl ChainId {
    /// Wraps a numeric EIP-155 chain reference.
    #[must_use]
    pub const fn new(reference: u64) -> Self {
        Self(reference)
    }

    /// Numeric chain reference.
    #[must_use]
    pub const fn reference(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{EIP155_NAMESPACE}:{}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, reference) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid CAIP-2 chain id '{s}'"))?;
        if namespace != EIP155_NAMESPACE {
            return Err(format!("Unexpected namespace: {namespace}"));
        }
        reference
            .parse()
            .map(Self)
            .map_err(|e| format!("invalid eip155 reference '{reference}': {e}"))
    }
}

impl Serialize for ChainId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Native gas currency of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    /// Display name (e.g. `"Ether"`).
    pub name: String,
    /// Ticker symbol (e.g. `"ETH"`).
    pub symbol: String,
    /// Decimal places of the smallest unit.
    pub decimals: u8,
}

impl NativeCurrency {
    /// Creates a currency record.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }

    /// Ether with 18 decimals.
    #[must_use]
    pub fn ether() -> Self {
        Self::new("Ether", "ETH", 18)
    }
}

/// Endpoints for one RPC usage context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcUrls {
    /// HTTP(S) JSON-RPC URLs, in preference order.
    pub http: Vec<String>,
    /// Optional `WebSocket` URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_socket: Vec<String>,
}

/// Block explorer linked from wallet UIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockExplorer {
    /// Display name.
    pub name: String,
    /// Base URL.
    pub url: String,
}

/// Static description of a blockchain network.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    /// Numeric EIP-155 chain id.
    pub id: u64,
    /// Human readable name.
    pub name: String,
    /// Native currency.
    pub native_currency: NativeCurrency,
    /// RPC endpoints keyed by usage context (`"default"`, `"public"`, ...).
    #[serde(default)]
    pub rpc_urls: BTreeMap<String, RpcUrls>,
    /// Default block explorer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_explorer: Option<BlockExplorer>,
    /// Whether this is a test network.
    #[serde(default)]
    pub testnet: bool,
}

impl ChainDescriptor {
    /// Creates a descriptor without endpoints.
    pub fn new(id: u64, name: impl Into<String>, native_currency: NativeCurrency) -> Self {
        Self {
            id,
            name: name.into(),
            native_currency,
            rpc_urls: BTreeMap::new(),
            block_explorer: None,
            testnet: false,
        }
    }

    /// Appends an HTTP endpoint under the given usage context.
    #[must_use]
    pub fn with_rpc_url(mut self, context: impl Into<String>, url: impl Into<String>) -> Self {
        self.rpc_urls
            .entry(context.into())
            .or_default()
            .http
            .push(url.into());
        self
    }

    /// Sets the block explorer.
    #[must_use]
    pub fn with_block_explorer(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.block_explorer = Some(BlockExplorer {
            name: name.into(),
            url: url.into(),
        });
        self
    }

    /// Marks the chain as a test network.
    #[must_use]
    pub fn testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// Returns the CAIP-2 chain ID for this descriptor.
    #[must_use]
    pub const fn chain_id(&self) -> ChainId {
        ChainId::new(self.id)
    }

    /// First HTTP endpoint of the `"default"` context.
    #[must_use]
    pub fn default_http_url(&self) -> Option<&str> {
        self.rpc_urls
            .get(DEFAULT_RPC_CONTEXT)
            .and_then(|urls| urls.http.first())
            .map(String::as_str)
    }

    /// All parseable HTTP endpoints across contexts, default context first.
    ///
    /// Entries that are not valid URLs are skipped.
    #[must_use]
    pub fn http_endpoints(&self) -> Vec<Url> {
        let default = self.rpc_urls.get(DEFAULT_RPC_CONTEXT);
        let others = self
            .rpc_urls
            .iter()
            .filter(|(context, _)| context.as_str() != DEFAULT_RPC_CONTEXT)
            .map(|(_, urls)| urls);
        default
            .into_iter()
            .chain(others)
            .flat_map(|urls| urls.http.iter())
            .filter_map(|raw| Url::parse(raw).ok())
            .collect()
    }
}
