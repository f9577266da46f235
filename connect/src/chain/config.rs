//! Chain tables of the TOML config, keyed by CAIP-2 chain identifier.
//!
//! ```toml
//! [chains."eip155:31337"]
//! name = "Local Anvil"
//! native_currency = { name = "Ether", symbol = "ETH", decimals = 18 }
//! rpc_urls.default.http = ["${RPC_URL:-http://10.185.76.64:8545}"]
//!
//! [chains."eip155:11155111"]
//! preset = "sepolia"
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use super::descriptor::{BlockExplorer, ChainDescriptor, ChainId, NativeCurrency, RpcUrls};
use super::presets;
use crate::error::Error;

/// One chain table as written in TOML (the id lives in the table key).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainTable {
    /// Start from a built-in chain; explicit fields below override it.
    #[serde(default)]
    pub preset: Option<String>,
    /// Human readable name.
    #[serde(default)]
    pub name: Option<String>,
    /// Native currency.
    #[serde(default)]
    pub native_currency: Option<NativeCurrency>,
    /// RPC endpoints by usage context. Replaces the preset's endpoints when set.
    #[serde(default)]
    pub rpc_urls: BTreeMap<String, RpcUrls>,
    /// Block explorer.
    #[serde(default)]
    pub block_explorer: Option<BlockExplorer>,
    /// Test network flag.
    #[serde(default)]
    pub testnet: Option<bool>,
}

impl ChainTable {
    /// Builds the descriptor for `chain_id` from this table.
    ///
    /// Presets that read the environment do so through `lookup`.
    fn into_descriptor<F>(self, chain_id: ChainId, lookup: &F) -> Result<ChainDescriptor, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match self.preset.as_deref() {
            Some(name) => {
                let preset = presets::by_name(name, lookup).ok_or_else(|| {
                    format!(
                        "unknown chain preset '{name}' (expected one of: {})",
                        presets::PRESET_NAMES.join(", ")
                    )
                })?;
                if preset.chain_id() != chain_id {
                    return Err(format!(
                        "preset '{name}' is {}, not {chain_id}",
                        preset.chain_id()
                    ));
                }
                Some(preset)
            }
            None => None,
        };

        let mut descriptor = match base {
            Some(preset) => preset,
            None => {
                let name = self
                    .name
                    .clone()
                    .ok_or_else(|| format!("chain {chain_id} is missing 'name'"))?;
                let currency = self
                    .native_currency
                    .clone()
                    .ok_or_else(|| format!("chain {chain_id} is missing 'native_currency'"))?;
                ChainDescriptor::new(chain_id.reference(), name, currency)
            }
        };

        if let Some(name) = self.name {
            descriptor.name = name;
        }
        if let Some(currency) = self.native_currency {
            descriptor.native_currency = currency;
        }
        if !self.rpc_urls.is_empty() {
            descriptor.rpc_urls = self.rpc_urls;
        }
        if self.block_explorer.is_some() {
            descriptor.block_explorer = self.block_explorer;
        }
        if let Some(testnet) = self.testnet {
            descriptor.testnet = testnet;
        }
        Ok(descriptor)
    }
}

/// Chain tables in file order, keyed by CAIP-2 chain identifier.
///
/// Tables become [`ChainDescriptor`]s through [`ChainsConfig::into_descriptors`].
#[derive(Debug, Clone, Default)]
pub struct ChainsConfig(pub Vec<(ChainId, ChainTable)>);

impl ChainsConfig {
    /// Resolves every table, preserving file order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown preset, a preset whose chain id
    /// differs from the table key, or an incomplete explicit table.
    pub fn into_descriptors<F>(self, lookup: &F) -> Result<Vec<ChainDescriptor>, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.0
            .into_iter()
            .map(|(chain_id, table)| table.into_descriptor(chain_id, lookup).map_err(Error::Config))
            .collect()
    }
}

impl<'de> Deserialize<'de> for ChainsConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use std::fmt;

        use serde::de::{MapAccess, Visitor};

        struct ChainsVisitor;

        impl<'de> Visitor<'de> for ChainsVisitor {
            type Value = ChainsConfig;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of chain identifiers to chain tables")
            }

            fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut tables = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(chain_id) = access.next_key::<ChainId>()? {
                    let table: ChainTable = access.next_value()?;
                    tables.push((chain_id, table));
                }
                Ok(ChainsConfig(tables))
            }
        }

        deserializer.deserialize_map(ChainsVisitor)
    }
}
