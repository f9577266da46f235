//! Blockchain network descriptors and their configuration.
//!
//! - [`descriptor`]: [`ChainDescriptor`] records and CAIP-2 [`ChainId`]s.
//! - [`presets`]: built-in chains (local Anvil, Sepolia).
//! - [`config`]: CAIP-2 keyed chain tables of the TOML config.

mod config;
mod descriptor;
pub mod presets;

pub use self::config::*;
pub use self::descriptor::*;
