//! Application metadata shown in a wallet's approval prompt.

use serde::{Deserialize, Serialize};

/// Descriptive record of the dApp requesting a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Origin the application is served from.
    #[serde(default)]
    pub url: String,
    /// Icon URLs.
    #[serde(default)]
    pub icons: Vec<String>,
}

impl AppMetadata {
    /// The CoinCred application record.
    #[must_use]
    pub fn coincred() -> Self {
        Self {
            name: "CoinCred".to_owned(),
            description: "Local Blockchain Testing with Anvil".to_owned(),
            url: "http://localhost:3000".to_owned(),
            icons: vec!["https://avatars.githubusercontent.com/u/37784886".to_owned()],
        }
    }
}
