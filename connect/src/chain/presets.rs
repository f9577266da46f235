//! Built-in chain definitions.

use super::descriptor::{ChainDescriptor, DEFAULT_RPC_CONTEXT, NativeCurrency};

/// Environment variable overriding the local chain's RPC endpoint.
pub const RPC_URL_ENV: &str = "RPC_URL";

/// RPC endpoint of the local Anvil node when [`RPC_URL_ENV`] is unset.
pub const DEFAULT_LOCAL_RPC_URL: &str = "http://10.185.76.64:8545";

/// Chain id Anvil and Hardhat use by default.
pub const LOCAL_ANVIL_ID: u64 = 31_337;

/// Sepolia test network chain id.
pub const SEPOLIA_ID: u64 = 11_155_111;

/// Names accepted by [`by_name`].
pub const PRESET_NAMES: [&str; 2] = ["local-anvil", "sepolia"];

/// Local Anvil test chain.
///
/// `rpc_override` replaces the default endpoint; `None` or a blank string
/// falls back to [`DEFAULT_LOCAL_RPC_URL`].
#[must_use]
pub fn local_anvil(rpc_override: Option<String>) -> ChainDescriptor {
    let rpc_url = rpc_override
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOCAL_RPC_URL.to_owned());
    ChainDescriptor::new(LOCAL_ANVIL_ID, "Local Anvil", NativeCurrency::ether())
        .with_rpc_url(DEFAULT_RPC_CONTEXT, rpc_url)
        .testnet(true)
}

/// Local Anvil test chain with the endpoint taken from [`RPC_URL_ENV`].
///
/// `lookup` reads the environment; pass [`process_env`](crate::env::process_env)
/// for the process environment.
#[must_use]
pub fn local_anvil_from_env<F>(lookup: &F) -> ChainDescriptor
where
    F: Fn(&str) -> Option<String>,
{
    local_anvil(lookup(RPC_URL_ENV))
}

/// Sepolia public test network.
#[must_use]
pub fn sepolia() -> ChainDescriptor {
    ChainDescriptor::new(
        SEPOLIA_ID,
        "Sepolia",
        NativeCurrency::new("Sepolia Ether", "ETH", 18),
    )
    .with_rpc_url(DEFAULT_RPC_CONTEXT, "https://rpc.sepolia.org")
    .with_block_explorer("Etherscan", "https://sepolia.etherscan.io")
    .testnet(true)
}

/// Looks up a preset by name (see [`PRESET_NAMES`]).
///
/// Environment-dependent presets read variables through `lookup`.
#[must_use]
pub fn by_name<F>(name: &str, lookup: &F) -> Option<ChainDescriptor>
where
    F: Fn(&str) -> Option<String>,
{
    match name {
        "local-anvil" => Some(local_anvil_from_env(lookup)),
        "sepolia" => Some(sepolia()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_anvil_falls_back_without_override() {
        let chain = local_anvil(None);
        assert_eq!(chain.id, 31337);
        assert_eq!(chain.name, "Local Anvil");
        assert_eq!(chain.native_currency, NativeCurrency::new("Ether", "ETH", 18));
        assert_eq!(chain.default_http_url(), Some("http://10.185.76.64:8545"));
    }

    #[test]
    fn blank_override_counts_as_unset() {
        let chain = local_anvil(Some("  ".to_owned()));
        assert_eq!(chain.default_http_url(), Some(DEFAULT_LOCAL_RPC_URL));
    }

    #[test]
    fn override_replaces_default_endpoint() {
        let chain = local_anvil(Some("http://127.0.0.1:8545".to_owned()));
        assert_eq!(chain.default_http_url(), Some("http://127.0.0.1:8545"));
        assert_eq!(chain.rpc_urls[DEFAULT_RPC_CONTEXT].http.len(), 1);
    }

    #[test]
    fn from_env_uses_lookup() {
        let unset = |_: &str| -> Option<String> { None };
        assert_eq!(
            local_anvil_from_env(&unset).default_http_url(),
            Some(DEFAULT_LOCAL_RPC_URL)
        );

        let set = |name: &str| (name == RPC_URL_ENV).then(|| "http://127.0.0.1:8545".to_owned());
        assert_eq!(
            local_anvil_from_env(&set).default_http_url(),
            Some("http://127.0.0.1:8545")
        );
    }

    #[test]
    fn presets_resolve_by_name() {
        let unset = |_: &str| -> Option<String> { None };
        for name in PRESET_NAMES {
            assert!(by_name(name, &unset).is_some(), "{name}");
        }
        assert_eq!(by_name("sepolia", &unset).map(|c| c.id), Some(SEPOLIA_ID));
        assert!(by_name("mainnet", &unset).is_none());

        let set = |name: &str| (name == RPC_URL_ENV).then(|| "http://127.0.0.1:8545".to_owned());
        assert_eq!(
            by_name("local-anvil", &set).and_then(|c| c.default_http_url().map(str::to_owned)),
            Some("http://127.0.0.1:8545".to_owned())
        );
    }
}
