//! `connect check` command: load, validate and print the configuration.

use std::path::Path;

use serde_json::json;

use super::load_env_file;
use crate::client::WalletClient;
use crate::config::load_config;
use crate::connector::build_connectors;
use crate::error::Error;

/// Execute the `check` command.
///
/// Performs every startup step short of binding the server, then prints the
/// resolved configuration (without connector secrets) to stdout.
///
/// # Errors
///
/// Returns the first startup error: unreadable env or config file, missing
/// project id, unresolved environment reference, or an invalid connector.
#[allow(clippy::print_stdout)]
pub fn run(config_path: &Path, env_file: Option<&Path>) -> Result<(), Error> {
    println!("{}", report(config_path, env_file)?);
    Ok(())
}

/// Resolved configuration as pretty-printed JSON.
fn report(config_path: &Path, env_file: Option<&Path>) -> Result<String, Error> {
    load_env_file(env_file)?;
    let config = load_config(config_path)?;
    let connectors = build_connectors(&config.connectors)?;
    let client = WalletClient::new(config.wallet, connectors);

    let summary = json!({
        "listen": format!("{}:{}", config.host, config.port),
        "wallet": client.info(),
    });
    serde_json::to_string_pretty(&summary)
        .map_err(|e| Error::config_with("failed to render configuration", e))
}
