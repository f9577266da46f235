//! The connect/disconnect control.
//!
//! The control never stores connection state. It renders whatever the
//! [`WalletClient`] reports and forwards the user's intent back to it.

use crate::client::{ConnectionState, WalletClient};
use crate::metadata::AppMetadata;
use crate::storage::Storage;

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Connect through the first available connector.
    Connect,
    /// End the current connection.
    Disconnect,
}

/// What the control shows for a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlView<'a> {
    /// A single "Connect Wallet" button.
    Connect,
    /// The connected address and a "Disconnect" button.
    Connected {
        /// Address as reported by the client.
        address: &'a str,
    },
}

impl<'a> ControlView<'a> {
    /// Derives the view from connection state.
    #[must_use]
    pub fn of(state: &'a ConnectionState) -> Self {
        state
            .address()
            .map_or(Self::Connect, |address| Self::Connected { address })
    }

    /// The only intent this view offers.
    #[must_use]
    pub const fn intent(self) -> Intent {
        match self {
            Self::Connect => Intent::Connect,
            Self::Connected { .. } => Intent::Disconnect,
        }
    }

    /// HTML fragment for this view.
    #[must_use]
    pub fn render(self) -> String {
        match self {
            Self::Connect => concat!(
                r#"<form method="post" action="/connect">"#,
                r#"<button type="submit">Connect Wallet</button>"#,
                "</form>"
            )
            .to_owned(),
            Self::Connected { address } => format!(
                concat!(
                    "<div>",
                    "<p>Connected to: {}</p>",
                    r#"<form method="post" action="/disconnect">"#,
                    r#"<button type="submit">Disconnect</button>"#,
                    "</form>",
                    "</div>"
                ),
                escape_html(address)
            ),
        }
    }
}

/// Dispatches intents to the client on behalf of the user.
#[derive(Debug, Clone, Copy)]
pub struct ConnectControl<'a> {
    client: &'a WalletClient,
}

impl<'a> ConnectControl<'a> {
    /// Creates a control backed by `client`.
    #[must_use]
    pub const fn new(client: &'a WalletClient) -> Self {
        Self { client }
    }

    /// Applies `intent` and returns the resulting state.
    ///
    /// An intent the current view does not offer (connect while connected,
    /// disconnect while disconnected) leaves the state untouched.
    ///
    /// Connect always uses the first connector and is a no-op when none is
    /// configured. Connection failures are not reported; the state simply
    /// stays disconnected.
    pub async fn dispatch(self, intent: Intent, storage: &mut impl Storage) -> ConnectionState {
        let current = self.client.state(storage);
        if ControlView::of(&current).intent() != intent {
            #[cfg(feature = "telemetry")]
            tracing::debug!(?intent, "intent not offered in the current state");
            return current;
        }
        match intent {
            Intent::Connect => {
                let Some(connector) = self.client.connectors().first() else {
                    #[cfg(feature = "telemetry")]
                    tracing::warn!("connect requested but no connectors are configured");
                    return current;
                };
                match self.client.connect(connector.as_ref(), storage).await {
                    Ok(state) => state,
                    Err(error) => {
                        #[cfg(feature = "telemetry")]
                        tracing::warn!(%error, connector = connector.id(), "connect failed");
                        #[cfg(not(feature = "telemetry"))]
                        let _ = error;
                        current
                    }
                }
            }
            Intent::Disconnect => self.client.disconnect(storage).await,
        }
    }
}

/// Full HTML page.
///
/// With `state` the control is rendered inline; without it the page loads
/// the control from `/control` once it is in the browser.
#[must_use]
pub fn render_page(metadata: &AppMetadata, state: Option<&ConnectionState>) -> String {
    let title = escape_html(&metadata.name);
    let icon = metadata
        .icons
        .first()
        .map(|icon| format!("<link rel=\"icon\" href=\"{}\">\n", escape_html(icon)))
        .unwrap_or_default();
    let control = match state {
        Some(state) => format!(
            "<div id=\"connect-control\">{}</div>\n",
            ControlView::of(state).render()
        ),
        None => concat!(
            "<div id=\"connect-control\"></div>\n",
            "<script>\n",
            "fetch('/control', { credentials: 'same-origin' })\n",
            "  .then((r) => r.text())\n",
            "  .then((html) => { document.getElementById('connect-control').innerHTML = html; });\n",
            "</script>\n",
        )
        .to_owned(),
    };

    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"en\">\n<head>\n",
            "<meta charset=\"utf-8\">\n",
            "<title>{title}</title>\n",
            "<meta name=\"description\" content=\"{description}\">\n",
            "{icon}",
            "</head>\n<body>\n<h1>{title}</h1>\n",
            "{control}",
            "</body>\n</html>\n",
        ),
        title = title,
        description = escape_html(&metadata.description),
        icon = icon,
        control = control,
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::Connection;
    use crate::client::tests::{ADDRESS, client_with, mock_client};
    use crate::connector::MockConnector;
    use crate::storage::CookieStorage;

    fn connected(address: &str) -> ConnectionState {
        ConnectionState::Connected(Connection {
            address: address.to_owned(),
            chain_id: 31337,
            connector_id: "mock".to_owned(),
        })
    }

    #[test]
    fn disconnected_renders_only_connect() {
        let state = ConnectionState::Disconnected;
        let view = ControlView::of(&state);
        assert_eq!(view, ControlView::Connect);
        assert_eq!(view.intent(), Intent::Connect);

        let html = view.render();
        assert_eq!(html.matches("<button").count(), 1);
        assert!(html.contains("Connect Wallet"));
        assert!(!html.contains("Disconnect"));
        assert!(!html.contains("0x"));
    }

    #[test]
    fn connected_renders_address_and_disconnect() {
        let state = connected("0xABC...");
        let view = ControlView::of(&state);
        assert_eq!(view.intent(), Intent::Disconnect);

        let html = view.render();
        assert!(html.contains("Connected to: 0xABC..."));
        assert!(html.contains("Disconnect"));
        assert!(!html.contains("Connect Wallet"));
        assert!(!html.contains("action=\"/connect\""));
    }

    #[test]
    fn address_is_escaped() {
        let state = connected("<script>alert(1)</script>");
        let html = ControlView::of(&state).render();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn connect_without_connectors_is_a_no_op() {
        let client = client_with(Vec::new());
        let mut jar = CookieStorage::default();

        let state = ConnectControl::new(&client)
            .dispatch(Intent::Connect, &mut jar)
            .await;
        assert_eq!(state, ConnectionState::Disconnected);
        assert!(jar.set_cookie_headers().is_empty());
    }

    #[tokio::test]
    async fn failed_connect_is_not_surfaced() {
        let client = client_with(vec![Arc::new(
            MockConnector::new(vec![ADDRESS.to_owned()]).failing(true),
        )]);
        let mut jar = CookieStorage::default();

        let state = ConnectControl::new(&client)
            .dispatch(Intent::Connect, &mut jar)
            .await;
        assert_eq!(state, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn connect_then_disconnect() {
        let client = mock_client();
        let control = ConnectControl::new(&client);
        let mut jar = CookieStorage::default();

        let state = control.dispatch(Intent::Connect, &mut jar).await;
        assert_eq!(state.address(), Some(ADDRESS));

        let state = control.dispatch(Intent::Disconnect, &mut jar).await;
        assert_eq!(state, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn intents_not_offered_are_ignored() {
        let client = mock_client();
        let control = ConnectControl::new(&client);

        let mut jar = CookieStorage::default();
        let state = control.dispatch(Intent::Disconnect, &mut jar).await;
        assert_eq!(state, ConnectionState::Disconnected);
        assert!(jar.set_cookie_headers().is_empty());

        let state = control.dispatch(Intent::Connect, &mut jar).await;
        let headers = jar.set_cookie_headers();
        let state_again = control.dispatch(Intent::Connect, &mut jar).await;
        assert_eq!(state_again, state);
        assert_eq!(jar.set_cookie_headers(), headers);
    }

    #[test]
    fn page_inlines_control_only_when_state_is_given() {
        let metadata = AppMetadata::coincred();
        let state = ConnectionState::Disconnected;

        let ssr = render_page(&metadata, Some(&state));
        assert!(ssr.contains("<title>CoinCred</title>"));
        assert!(ssr.contains("Connect Wallet"));
        assert!(!ssr.contains("fetch('/control'"));

        let shell = render_page(&metadata, None);
        assert!(!shell.contains("Connect Wallet"));
        assert!(shell.contains("fetch('/control'"));
    }
}
