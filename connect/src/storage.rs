//! Session persistence backends.
//!
//! The client persists the current connection under `"<key>.store"` so that a
//! page reload restores it. Two backends are available:
//!
//! - [`CookieStorage`]: a per-request cookie jar. Values travel back to the
//!   browser as `Set-Cookie` headers, hex-encoded JSON.
//! - [`MemoryStorage`]: a process-wide map shared by every client of the
//!   server. Intended for local development and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Key-value persistence used for connection sessions.
pub trait Storage {
    /// Reads an item.
    fn get_item(&self, key: &str) -> Option<String>;
    /// Writes an item.
    fn set_item(&mut self, key: &str, value: String);
    /// Deletes an item.
    fn remove_item(&mut self, key: &str);
}

/// Which backend persists connection sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Browser cookies (survives reloads, one session per browser).
    #[default]
    Cookie,
    /// In-process memory (one session shared by all clients).
    Memory,
}

/// Storage selection and key prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend.
    #[serde(default)]
    pub kind: StorageKind,
    /// Key prefix; the session item is stored as `"<key>.store"`.
    #[serde(default = "default_key")]
    pub key: String,
}

fn default_key() -> String {
    "coincred".to_owned()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::default(),
            key: default_key(),
        }
    }
}

impl StorageConfig {
    /// Cookie-backed storage under the default key.
    #[must_use]
    pub fn cookie() -> Self {
        Self::default()
    }

    /// Name of the item holding the persisted connection.
    #[must_use]
    pub fn item_key(&self) -> String {
        format!("{}.store", self.key)
    }

    /// Checks that [`item_key`](Self::item_key) is usable as a cookie name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the key is empty or contains a character
    /// outside the RFC 6265 token set (spaces, controls, `;`, `=`, quotes and
    /// other separators).
    pub fn validate(&self) -> Result<(), Error> {
        if self.key.is_empty() || !is_cookie_token(&self.key) {
            return Err(Error::config(format!(
                "storage key '{}' is not a valid cookie name",
                self.key
            )));
        }
        Ok(())
    }
}

/// RFC 6265 `token`: visible ASCII without separators.
fn is_cookie_token(name: &str) -> bool {
    const SEPARATORS: &[u8] = b"()<>@,;:\\\"/[]?={}";
    name.bytes()
        .all(|b| b.is_ascii_graphic() && !SEPARATORS.contains(&b))
}

/// Cookie jar for one request/response exchange.
///
/// Reads come from the request's `Cookie` header; writes and removals are
/// collected and rendered by [`CookieStorage::set_cookie_headers`].
#[derive(Debug, Default)]
pub struct CookieStorage {
    incoming: BTreeMap<String, String>,
    changes: BTreeMap<String, Option<String>>,
}

impl CookieStorage {
    /// Parses the values of one or more `Cookie` request headers.
    ///
    /// Cookies whose value is not hex-encoded UTF-8 are ignored.
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let incoming = headers
            .into_iter()
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter_map(|(name, value)| {
                let bytes = hex::decode(value.trim()).ok()?;
                let value = String::from_utf8(bytes).ok()?;
                Some((name.trim().to_owned(), value))
            })
            .collect();
        Self {
            incoming,
            changes: BTreeMap::new(),
        }
    }

    /// `Set-Cookie` header values for every write and removal made so far.
    #[must_use]
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.changes
            .iter()
            .map(|(name, value)| match value {
                Some(value) => format!("{name}={}; Path=/; SameSite=Lax", hex::encode(value)),
                None => format!("{name}=; Path=/; Max-Age=0; SameSite=Lax"),
            })
            .collect()
    }
}

impl Storage for CookieStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        match self.changes.get(key) {
            Some(change) => change.clone(),
            None => self.incoming.get(key).cloned(),
        }
    }

    fn set_item(&mut self, key: &str, value: String) {
        self.changes.insert(key.to_owned(), Some(value));
    }

    fn remove_item(&mut self, key: &str) {
        self.changes.insert(key.to_owned(), None);
    }
}

/// Process-wide in-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage(Arc<Mutex<HashMap<String, String>>>);

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let map = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        map.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) {
        let mut map = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        map.insert(key.to_owned(), value);
    }

    fn remove_item(&mut self, key: &str) {
        let mut map = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        map.remove(key);
    }
}

/// Storage handed to the client for one user interaction.
#[derive(Debug)]
pub enum SessionStorage {
    /// Cookie jar of the current request.
    Cookie(CookieStorage),
    /// Shared memory store.
    Memory(MemoryStorage),
}

impl SessionStorage {
    /// `Set-Cookie` values to attach to the response (empty for memory storage).
    #[must_use]
    pub fn set_cookie_headers(&self) -> Vec<String> {
        match self {
            Self::Cookie(jar) => jar.set_cookie_headers(),
            Self::Memory(_) => Vec::new(),
        }
    }
}

impl Storage for SessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        match self {
            Self::Cookie(jar) => jar.get_item(key),
            Self::Memory(mem) => mem.get_item(key),
        }
    }

    fn set_item(&mut self, key: &str, value: String) {
        match self {
            Self::Cookie(jar) => jar.set_item(key, value),
            Self::Memory(mem) => mem.set_item(key, value),
        }
    }

    fn remove_item(&mut self, key: &str) {
        match self {
            Self::Cookie(jar) => jar.remove_item(key),
            Self::Memory(mem) => mem.remove_item(key),
        }
    }
}

/// Persisted form of an established connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConnection {
    /// Connector that established the connection.
    pub connector_id: String,
    /// Connected account address.
    pub address: String,
    /// Chain the connection was made on.
    pub chain_id: u64,
}

impl StoredConnection {
    /// Reads the stored connection, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if an item exists but is not a valid connection record.
    pub fn load(storage: &impl Storage, key: &str) -> Result<Option<Self>, Error> {
        storage
            .get_item(key)
            .map(|raw| {
                serde_json::from_str(&raw)
                    .map_err(|e| Error::storage_with(format!("malformed session '{key}'"), e))
            })
            .transpose()
    }

    /// Writes this connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialised.
    pub fn save(&self, storage: &mut impl Storage, key: &str) -> Result<(), Error> {
        let raw = serde_json::to_string(self)
            .map_err(|e| Error::storage_with("failed to encode session", e))?;
        storage.set_item(key, raw);
        Ok(())
    }
}
