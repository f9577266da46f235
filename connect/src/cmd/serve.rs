//! `connect serve` command: start the wallet connection HTTP server.
//!
//! Reads TOML configuration, builds the connectors and the wallet client,
//! then starts an Axum HTTP server with graceful shutdown support.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

use super::load_env_file;
use crate::client::WalletClient;
use crate::config::load_config;
use crate::connector::build_connectors;
use crate::error::Error;
use crate::routes;
use crate::signal::shutdown_token;

#[cfg(feature = "telemetry")]
use crate::telemetry::Telemetry;

/// Cross-origin policy: browsers on other origins may read pages and state
/// but may not script the connect and disconnect actions.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any)
}

/// Execute the `serve` command.
///
/// # Errors
///
/// Returns an error if env or configuration loading, connector construction,
/// or server binding fails.
#[allow(clippy::cognitive_complexity)]
pub async fn run(
    config_path: &Path,
    log_level: &str,
    env_file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    load_env_file(env_file)?;

    #[cfg(feature = "telemetry")]
    let telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_log_level(log_level)
        .register();
    #[cfg(not(feature = "telemetry"))]
    let _ = log_level;

    let config = load_config(config_path)?;
    let connectors = build_connectors(&config.connectors)?;

    #[cfg(feature = "telemetry")]
    for chain in config.wallet.chains() {
        let endpoints: Vec<String> = chain.http_endpoints().iter().map(ToString::to_string).collect();
        tracing::info!(
            chain = %chain.chain_id(),
            name = %chain.name,
            rpc = chain.default_http_url().unwrap_or("none"),
            ?endpoints,
            "chain configured"
        );
    }
    #[cfg(feature = "telemetry")]
    tracing::info!(
        project_id = %config.wallet.project_id(),
        connectors = connectors.len(),
        ssr = config.wallet.ssr(),
        "wallet configured"
    );

    let client = Arc::new(WalletClient::new(config.wallet, connectors));

    let http_endpoints = Router::new().merge(routes::routes().with_state(client));
    #[cfg(feature = "telemetry")]
    let http_endpoints = http_endpoints.layer(telemetry.http_tracing());
    let http_endpoints = http_endpoints.layer(cors_layer());

    let addr = SocketAddr::new(config.host, config.port);
    #[cfg(feature = "telemetry")]
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Server(format!("failed to bind to {addr}: {e}")));
    #[cfg(feature = "telemetry")]
    let listener = listener.inspect_err(|e| tracing::error!("{e}"));
    let listener = listener?;

    let shutdown = shutdown_token()?;
    axum::serve(listener, http_endpoints)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| Error::Server(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::header::{ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_REQUEST_METHOD, ORIGIN};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::client::tests::mock_client;

    #[tokio::test]
    async fn preflight_offers_only_get() {
        let app = routes::routes()
            .with_state(Arc::new(mock_client()))
            .layer(cors_layer());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/connect")
                    .header(ORIGIN, "https://elsewhere.example")
                    .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("infallible");

        let allowed = response
            .headers()
            .get(ACCESS_CONTROL_ALLOW_METHODS)
            .and_then(|v| v.to_str().ok())
            .expect("allow-methods header");
        assert_eq!(allowed, "GET");
    }
}
