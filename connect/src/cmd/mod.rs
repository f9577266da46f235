//! CLI definitions and command implementations.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::error::Error;

pub mod check;
pub mod init;
pub mod serve;

/// CoinCred wallet connection service.
#[derive(Debug, Parser)]
#[command(name = "connect")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a default TOML configuration file.
    Init {
        /// Output path for the configuration file.
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite the file if it already exists.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Validate the configuration and print the resolved result as JSON.
    Check {
        /// Path to the TOML configuration file.
        #[arg(short, long, env = "CONFIG", default_value = "config.toml")]
        config: PathBuf,

        /// Dotenv file to load instead of searching for `.env`.
        #[arg(long)]
        env_file: Option<PathBuf>,
    },

    /// Start the HTTP server.
    Serve {
        /// Path to the TOML configuration file.
        #[arg(short, long, env = "CONFIG", default_value = "config.toml")]
        config: PathBuf,

        /// Log filter used when `RUST_LOG` is unset.
        #[arg(long, env = "LOG_LEVEL", default_value = "info")]
        log_level: String,

        /// Dotenv file to load instead of searching for `.env`.
        #[arg(long)]
        env_file: Option<PathBuf>,
    },
}

/// Loads dotenv variables into the process environment.
///
/// Without `env_file`, a `.env` in the working directory or one of its
/// parents is loaded if present. Variables already set are kept.
///
/// # Errors
///
/// Returns an error if an explicit `env_file` cannot be read or parsed.
pub fn load_env_file(env_file: Option<&Path>) -> Result<(), Error> {
    match env_file {
        Some(path) => dotenvy::from_path(path).map_err(|e| {
            Error::config_with(format!("failed to load env file '{}'", path.display()), e)
        }),
        None => {
            dotenvy::dotenv().ok();
            Ok(())
        }
    }
}
