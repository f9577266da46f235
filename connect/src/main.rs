//! CoinCred wallet connection service
//!
//! A CLI tool and HTTP server that connects a user's wallet to an EVM chain
//! (a local Anvil node by default) and renders a connect/disconnect control.
//! Sessions survive page reloads through cookie-backed storage.
//!
//! ```sh
//! connect init            # Generate default config.toml
//! connect check           # Validate config.toml and print the result
//! connect serve           # Start the server
//! ```

mod chain;
mod client;
mod cmd;
mod config;
mod connector;
mod control;
mod env;
mod error;
mod metadata;
mod routes;
mod signal;
mod storage;
#[cfg(feature = "telemetry")]
mod telemetry;

use clap::Parser;
use cmd::{Cli, Commands};

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { output, force } => cmd::init::run(&output, force).map_err(Into::into),
        Commands::Check { config, env_file } => {
            cmd::check::run(&config, env_file.as_deref()).map_err(Into::into)
        }
        Commands::Serve {
            config,
            log_level,
            env_file,
        } => cmd::serve::run(&config, &log_level, env_file.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
