//! Wallet configuration, config file loading and default template generation.
//!
//! This module provides:
//!
//! - [`build_config`]: Composes chains, project id and metadata into a
//!   validated [`WalletConfig`].
//! - [`load_config`]: Reads a TOML file, resolves environment references and
//!   builds the [`AppConfig`].
//! - [`generate_default_config`]: Produces a commented TOML template.
//!
//! # Configuration File Format
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 3000
//! project_id = "${WALLETCONNECT_PROJECT_ID:-a354850f4268cf041c5c0ba35d69e4ae}"
//!
//! [chains."eip155:31337"]
//! name = "Local Anvil"
//! native_currency = { name = "Ether", symbol = "ETH", decimals = 18 }
//! rpc_urls.default.http = ["${RPC_URL:-http://10.185.76.64:8545}"]
//!
//! [[connectors]]
//! type = "local"
//! private_key = "$LOCAL_PRIVATE_KEY"
//! ```

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chain::{ChainDescriptor, ChainsConfig, presets};
use crate::connector::ConnectorConfig;
use crate::env::{process_env, resolve_toml_with};
use crate::error::Error;
use crate::metadata::AppMetadata;
use crate::storage::StorageConfig;

/// Identifier issued by the wallet-connection service. Never empty.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectId(Arc<str>);

impl ProjectId {
    /// Validates and wraps a project identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingProjectId`] if `raw` is empty or whitespace.
    pub fn new(raw: &str) -> Result<Self, Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::MissingProjectId);
        }
        Ok(Self(trimmed.into()))
    }

    /// The identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProjectId").field(&self.as_str()).finish()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration consumed by the wallet client at startup.
///
/// Built once per process and shared read-only afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletConfig {
    chains: Vec<ChainDescriptor>,
    project_id: ProjectId,
    metadata: AppMetadata,
    ssr: bool,
    storage: StorageConfig,
}

/// Composes a [`WalletConfig`] with server rendering on and cookie storage.
///
/// # Errors
///
/// Returns [`Error::MissingProjectId`] if `project_id` is empty, or
/// [`Error::Config`] if no chain is given.
pub fn build_config(
    chains: Vec<ChainDescriptor>,
    project_id: &str,
    metadata: AppMetadata,
) -> Result<WalletConfig, Error> {
    let project_id = ProjectId::new(project_id)?;
    if chains.is_empty() {
        return Err(Error::config("at least one chain must be configured"));
    }
    Ok(WalletConfig {
        chains,
        project_id,
        metadata,
        ssr: true,
        storage: StorageConfig::cookie(),
    })
}

impl WalletConfig {
    /// Enables or disables server-side rendering of connection state.
    #[must_use]
    pub fn with_ssr(mut self, ssr: bool) -> Self {
        self.ssr = ssr;
        self
    }

    /// Selects the session storage backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the storage key is not a valid cookie name.
    pub fn with_storage(mut self, storage: StorageConfig) -> Result<Self, Error> {
        storage.validate()?;
        self.storage = storage;
        Ok(self)
    }

    /// Configured chains, primary chain first.
    #[must_use]
    pub fn chains(&self) -> &[ChainDescriptor] {
        &self.chains
    }

    /// The chain new connections are made on.
    #[must_use]
    pub fn primary_chain(&self) -> &ChainDescriptor {
        &self.chains[0]
    }

    /// Looks up a configured chain by numeric id.
    #[must_use]
    pub fn chain(&self, id: u64) -> Option<&ChainDescriptor> {
        self.chains.iter().find(|chain| chain.id == id)
    }

    /// Wallet-connection project identifier.
    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Application metadata.
    #[must_use]
    pub const fn metadata(&self) -> &AppMetadata {
        &self.metadata
    }

    /// Whether connection state is rendered on the server.
    #[must_use]
    pub const fn ssr(&self) -> bool {
        self.ssr
    }

    /// Session storage selection.
    #[must_use]
    pub const fn storage(&self) -> &StorageConfig {
        &self.storage
    }
}

/// Everything the `serve` command needs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind address.
    pub host: IpAddr,
    /// Bind port.
    pub port: u16,
    /// Validated wallet configuration.
    pub wallet: WalletConfig,
    /// Connectors, in the order the UI offers them.
    pub connectors: Vec<ConnectorConfig>,
}

/// Raw TOML document, after environment references are resolved.
#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default = "default_host")]
    host: IpAddr,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    project_id: String,
    #[serde(default = "default_ssr")]
    ssr: bool,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default = "AppMetadata::coincred")]
    metadata: AppMetadata,
    #[serde(default)]
    chains: Option<ChainsConfig>,
    #[serde(default)]
    connectors: Vec<ConnectorConfig>,
}

fn default_host() -> IpAddr {
    process_env("HOST")
        .and_then(|h| h.parse().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn default_port() -> u16 {
    process_env("PORT")
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000)
}

const fn default_ssr() -> bool {
    true
}

/// Parses config file content, resolving references with `lookup`.
///
/// Without a `[chains]` table the local Anvil chain is used.
///
/// # Errors
///
/// Returns an error if the TOML is invalid, a required environment reference
/// is unset, or the resulting wallet configuration is invalid.
pub fn parse_config<F>(content: &str, lookup: &F) -> Result<AppConfig, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let mut doc: toml::Value =
        toml::from_str(content).map_err(|e| Error::config_with("invalid TOML", e))?;
    resolve_toml_with(&mut doc, lookup)?;
    let file = doc
        .try_into::<FileConfig>()
        .map_err(|e| Error::config_with("invalid configuration", e))?;

    let chains = match file.chains {
        Some(chains) => chains.into_descriptors(lookup)?,
        None => vec![presets::local_anvil_from_env(lookup)],
    };
    let wallet = build_config(chains, &file.project_id, file.metadata)?
        .with_ssr(file.ssr)
        .with_storage(file.storage)?;

    Ok(AppConfig {
        host: file.host,
        port: file.port,
        wallet,
        connectors: file.connectors,
    })
}

/// Load configuration from a TOML file at the given path.
///
/// Environment references are resolved against the process environment.
///
/// # Errors
///
/// Returns an error if the file cannot be resolved, read, or parsed, or if the
/// configuration is invalid (see [`parse_config`]).
pub fn load_config(path: &Path) -> Result<AppConfig, Error> {
    let config_path = path.canonicalize().map_err(|e| {
        Error::config_with(format!("failed to resolve config path '{}'", path.display()), e)
    })?;
    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        Error::config_with(
            format!("failed to read config file '{}'", config_path.display()),
            e,
        )
    })?;
    parse_config(&content, &process_env)
}

/// Generate a default TOML configuration template.
#[must_use]
pub fn generate_default_config() -> String {
    String::from(
        r#"# CoinCred wallet connection configuration

# Server bind address and port.
# Can also be set via HOST / PORT environment variables.
host = "127.0.0.1"
port = 3000

# Project id issued by the wallet-connection service. Required.
# Values support environment variable references: "$VAR", "${VAR}",
# "${VAR:-fallback}".
project_id = "${WALLETCONNECT_PROJECT_ID:-a354850f4268cf041c5c0ba35d69e4ae}"

# Render the connect control on the server from the stored session.
ssr = true

# Where the connection session is persisted: "cookie" or "memory".
[storage]
kind = "cookie"
key = "coincred"

[metadata]
name = "CoinCred"
description = "Local Blockchain Testing with Anvil"
url = "http://localhost:3000"
icons = ["https://avatars.githubusercontent.com/u/37784886"]

# ── Chains ──────────────────────────────────────────────────────────
# Key format: "eip155:<chain_id>". The first chain is used for new
# connections. A table may name a preset ("local-anvil", "sepolia") and
# override any of its fields.

[chains."eip155:31337"]
name = "Local Anvil"
native_currency = { name = "Ether", symbol = "ETH", decimals = 18 }
rpc_urls.default.http = ["${RPC_URL:-http://10.185.76.64:8545}"]
testnet = true

# [chains."eip155:11155111"]
# preset = "sepolia"

# ── Connectors ──────────────────────────────────────────────────────
# The connect button uses the first connector.

[[connectors]]
type = "local"
# First default Anvil account.
private_key = "${LOCAL_PRIVATE_KEY:-0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80}"
"#,
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::chain::DEFAULT_RPC_CONTEXT;
    use crate::storage::StorageKind;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn empty_project_id_is_fatal() {
        for raw in ["", "   "] {
            let err = build_config(
                vec![presets::local_anvil(None)],
                raw,
                AppMetadata::coincred(),
            )
            .expect_err("must fail");
            assert!(matches!(err, Error::MissingProjectId));
        }
    }

    #[test]
    fn builds_with_project_id_and_one_chain() {
        let config = build_config(
            vec![presets::local_anvil(None)],
            "a354850f4268cf041c5c0ba35d69e4ae",
            AppMetadata::coincred(),
        )
        .expect("valid config");

        assert_eq!(config.project_id().as_str(), "a354850f4268cf041c5c0ba35d69e4ae");
        assert_eq!(config.primary_chain().id, 31337);
        assert!(config.ssr());
        assert_eq!(config.storage().kind, StorageKind::Cookie);
        assert!(config.chain(11_155_111).is_none());
    }

    #[test]
    fn no_chains_is_rejected() {
        let err = build_config(Vec::new(), "abc", AppMetadata::coincred()).expect_err("no chains");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn default_template_parses() {
        let config = parse_config(&generate_default_config(), &no_env).expect("template is valid");

        assert_eq!(config.port, 3000);
        assert_eq!(
            config.wallet.project_id().as_str(),
            "a354850f4268cf041c5c0ba35d69e4ae"
        );
        assert_eq!(
            config.wallet.primary_chain().default_http_url(),
            Some("http://10.185.76.64:8545")
        );
        assert_eq!(config.connectors.len(), 1);
        assert_eq!(config.wallet.metadata(), &AppMetadata::coincred());
    }

    #[test]
    fn rpc_override_flows_into_chain() {
        let lookup = |name: &str| (name == "RPC_URL").then(|| "http://127.0.0.1:8545".to_owned());
        let config = parse_config(&generate_default_config(), &lookup).expect("valid");
        assert_eq!(
            config.wallet.primary_chain().rpc_urls[DEFAULT_RPC_CONTEXT].http,
            ["http://127.0.0.1:8545"]
        );
    }

    #[test]
    fn missing_chains_table_uses_local_anvil() {
        let config = parse_config("project_id = \"abc\"", &no_env).expect("valid");
        assert_eq!(config.wallet.chains(), [presets::local_anvil(None)]);
        assert!(config.connectors.is_empty());
    }

    #[test]
    fn missing_project_id_in_file_is_fatal() {
        let err = parse_config("port = 3000", &no_env).expect_err("no project id");
        assert!(matches!(err, Error::MissingProjectId));

        let err = parse_config("project_id = \"$WALLETCONNECT_PROJECT_ID\"", &no_env)
            .expect_err("unresolved reference");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn memory_storage_and_ssr_off() {
        let config = parse_config(
            "project_id = \"abc\"\nssr = false\n[storage]\nkind = \"memory\"",
            &no_env,
        )
        .expect("valid");
        assert!(!config.wallet.ssr());
        assert_eq!(config.wallet.storage().kind, StorageKind::Memory);
    }

    #[test]
    fn invalid_storage_key_is_rejected() {
        let err = parse_config(
            "project_id = \"abc\"\n[storage]\nkey = \"my app;v2\"",
            &no_env,
        )
        .expect_err("not a cookie name");
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("my app;v2"));
    }

    #[test]
    fn local_anvil_preset_follows_lookup() {
        let lookup = |name: &str| (name == "RPC_URL").then(|| "http://127.0.0.1:9999".to_owned());
        let config = parse_config(
            "project_id = \"abc\"\n[chains.\"eip155:31337\"]\npreset = \"local-anvil\"",
            &lookup,
        )
        .expect("valid");
        assert_eq!(
            config.wallet.primary_chain().default_http_url(),
            Some("http://127.0.0.1:9999")
        );
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"project_id = \"from-file\"\nport = 4000\n")
            .expect("writable");

        let config = load_config(file.path()).expect("loadable");
        assert_eq!(config.port, 4000);
        assert_eq!(config.wallet.project_id().as_str(), "from-file");

        assert!(load_config(Path::new("/definitely/not/here.toml")).is_err());
    }
}
