//! HTTP route handlers.
//!
//! Page endpoints (`/`, `/control`), the two control actions (`/connect`,
//! `/disconnect`) and a small JSON API (`/api/state`, `/api/config`,
//! `/health`).
//!
//! Every handler opens the session storage from the request's cookies and
//! writes any session change back as `Set-Cookie` headers. The actions answer
//! `303 See Other` to `/`, so a browser reloads the page after each click.
//! Actions posted from another origin are refused with `403 Forbidden`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{COOKIE, HOST, ORIGIN, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
#[cfg(feature = "telemetry")]
use tracing::instrument;
use url::Url;

use crate::client::WalletClient;
use crate::control::{ConnectControl, ControlView, Intent, render_page};
use crate::storage::SessionStorage;

/// Type alias for the shared client state used by Axum route handlers.
pub type ClientState = Arc<WalletClient>;

/// Creates the Axum router with all endpoints.
pub fn routes() -> Router<ClientState> {
    Router::new()
        .route("/", get(get_index))
        .route("/control", get(get_control))
        .route("/connect", post(post_connect))
        .route("/disconnect", post(post_disconnect))
        .route("/api/state", get(get_state))
        .route("/api/config", get(get_config))
        .route("/health", get(get_health))
}

fn open_session(client: &WalletClient, headers: &HeaderMap) -> SessionStorage {
    client.session(
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok()),
    )
}

/// Attaches the session's pending cookie changes to `response`.
fn with_session(session: &SessionStorage, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    for cookie in session.set_cookie_headers() {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

/// `GET /`: the application page.
///
/// With server rendering on, the control reflects the restored session;
/// otherwise the page fetches it from `/control`.
#[cfg_attr(feature = "telemetry", instrument(skip_all))]
async fn get_index(State(client): State<ClientState>, headers: HeaderMap) -> Response {
    let metadata = client.config().metadata();
    if !client.config().ssr() {
        return Html(render_page(metadata, None)).into_response();
    }
    let mut session = open_session(&client, &headers);
    let state = client.state(&mut session);
    with_session(&session, Html(render_page(metadata, Some(&state))))
}

/// `GET /control`: the control fragment.
#[cfg_attr(feature = "telemetry", instrument(skip_all))]
async fn get_control(State(client): State<ClientState>, headers: HeaderMap) -> Response {
    let mut session = open_session(&client, &headers);
    let state = client.state(&mut session);
    with_session(&session, Html(ControlView::of(&state).render()))
}

/// Whether the request's `Origin` (if any) names the host it was sent to.
fn same_origin(headers: &HeaderMap) -> bool {
    let Some(origin) = headers.get(ORIGIN) else {
        return true;
    };
    let origin = origin.to_str().ok().and_then(|o| Url::parse(o).ok());
    let host = headers.get(HOST).and_then(|h| h.to_str().ok());
    match (origin, host) {
        (Some(origin), Some(host)) => {
            let authority = match (origin.host_str(), origin.port()) {
                (Some(name), Some(port)) => format!("{name}:{port}"),
                (Some(name), None) => name.to_owned(),
                (None, _) => return false,
            };
            authority.eq_ignore_ascii_case(host)
        }
        _ => false,
    }
}

async fn dispatch(client: &WalletClient, headers: &HeaderMap, intent: Intent) -> Response {
    if !same_origin(headers) {
        #[cfg(feature = "telemetry")]
        tracing::warn!(?intent, "cross-origin action refused");
        return StatusCode::FORBIDDEN.into_response();
    }
    let mut session = open_session(client, headers);
    ConnectControl::new(client)
        .dispatch(intent, &mut session)
        .await;
    with_session(&session, Redirect::to("/"))
}

/// `POST /connect`: connect through the first connector.
#[cfg_attr(feature = "telemetry", instrument(skip_all))]
async fn post_connect(State(client): State<ClientState>, headers: HeaderMap) -> Response {
    dispatch(&client, &headers, Intent::Connect).await
}

/// `POST /disconnect`: end the current connection.
#[cfg_attr(feature = "telemetry", instrument(skip_all))]
async fn post_disconnect(State(client): State<ClientState>, headers: HeaderMap) -> Response {
    dispatch(&client, &headers, Intent::Disconnect).await
}

/// `GET /api/state`: connection state as JSON.
#[cfg_attr(feature = "telemetry", instrument(skip_all))]
async fn get_state(State(client): State<ClientState>, headers: HeaderMap) -> Response {
    let mut session = open_session(&client, &headers);
    let state = client.state(&mut session);
    with_session(&session, Json(state))
}

/// `GET /api/config`: public configuration and connector list.
#[cfg_attr(feature = "telemetry", instrument(skip_all))]
async fn get_config(State(client): State<ClientState>) -> impl IntoResponse {
    (StatusCode::OK, Json(json!(client.info())))
}

/// `GET /health`: lightweight liveness check.
#[cfg_attr(feature = "telemetry", instrument(skip_all))]
async fn get_health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, header::LOCATION};
    use tower::ServiceExt;

    use super::*;
    use crate::client::tests::{ADDRESS, client_with, mock_client};
    use crate::connector::MockConnector;

    fn app(client: WalletClient) -> Router {
        routes().with_state(Arc::new(client))
    }

    async fn send(app: &Router, method: Method, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        app.clone()
            .oneshot(request.body(Body::empty()).expect("request"))
            .await
            .expect("infallible")
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf-8")
    }

    fn session_cookie(response: &Response) -> String {
        let header = response
            .headers()
            .get(SET_COOKIE)
            .expect("set-cookie")
            .to_str()
            .expect("ascii");
        header.split(';').next().expect("pair").to_owned()
    }

    #[tokio::test]
    async fn connect_flow_over_http() {
        let app = app(mock_client());

        let page = body_text(send(&app, Method::GET, "/", None).await).await;
        assert!(page.contains("Connect Wallet"));
        assert!(!page.contains(ADDRESS));

        let response = send(&app, Method::POST, "/connect", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).map(HeaderValue::as_bytes),
            Some(b"/".as_slice())
        );
        let cookie = session_cookie(&response);

        let page = body_text(send(&app, Method::GET, "/", Some(&cookie)).await).await;
        assert!(page.contains(&format!("Connected to: {ADDRESS}")));
        assert!(page.contains("Disconnect"));
        assert!(!page.contains("Connect Wallet"));

        let state = body_text(send(&app, Method::GET, "/api/state", Some(&cookie)).await).await;
        let state: serde_json::Value = serde_json::from_str(&state).expect("json");
        assert_eq!(state["isConnected"], true);
        assert_eq!(state["address"], ADDRESS);

        let response = send(&app, Method::POST, "/disconnect", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cleared = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("removal cookie");
        assert!(cleared.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn rejected_connect_redirects_without_cookie() {
        let app = app(client_with(vec![Arc::new(
            MockConnector::new(vec![ADDRESS.to_owned()]).failing(true),
        )]));

        let response = send(&app, Method::POST, "/connect", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn connect_without_connectors_redirects() {
        let app = app(client_with(Vec::new()));
        let response = send(&app, Method::POST, "/connect", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn stale_cookie_is_cleared_on_read() {
        let app = app(mock_client());
        let stale = format!(
            "coincred.store={}",
            hex::encode(r#"{"connectorId":"gone","address":"0x1","chainId":31337}"#)
        );

        let response = send(&app, Method::GET, "/control", Some(&stale)).await;
        assert!(
            response
                .headers()
                .get(SET_COOKIE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.contains("Max-Age=0"))
        );
        assert!(body_text(response).await.contains("Connect Wallet"));
    }

    #[tokio::test]
    async fn shell_page_when_ssr_is_off() {
        let client = mock_client();
        let config = client.config().clone().with_ssr(false);
        let connectors = client.connectors().to_vec();
        let app = app(WalletClient::new(config, connectors));

        let page = body_text(send(&app, Method::GET, "/", None).await).await;
        assert!(page.contains("fetch('/control'"));
        assert!(!page.contains("Connect Wallet"));
    }

    async fn post_from(app: &Router, uri: &str, origin: &str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(HOST, "127.0.0.1:3000")
            .header(ORIGIN, origin)
            .body(Body::empty())
            .expect("request");
        app.clone().oneshot(request).await.expect("infallible")
    }

    #[tokio::test]
    async fn cross_origin_actions_are_refused() {
        let app = app(mock_client());

        for uri in ["/connect", "/disconnect"] {
            let response = post_from(&app, uri, "https://elsewhere.example").await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
            assert!(response.headers().get(SET_COOKIE).is_none());
        }

        let response = post_from(&app, "/connect", "null").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = post_from(&app, "/connect", "http://127.0.0.1:3000").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.headers().get(SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn config_and_health_endpoints() {
        let app = app(mock_client());

        let config = body_text(send(&app, Method::GET, "/api/config", None).await).await;
        let config: serde_json::Value = serde_json::from_str(&config).expect("json");
        assert_eq!(config["projectId"], "a354850f4268cf041c5c0ba35d69e4ae");
        assert_eq!(config["chains"][0]["id"], 31337);
        assert_eq!(config["connectors"][0]["id"], "mock");
        assert_eq!(config["ssr"], true);

        let health = body_text(send(&app, Method::GET, "/health", None).await).await;
        assert_eq!(health, r#"{"status":"ok"}"#);
    }
}
