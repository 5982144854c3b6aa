//! Session state and the persisted custom-data map.

use crate::bridge::{Account, StateStore};
use serde_json::Value;
use tracing::warn;

/// Storage key for the custom-data map.
pub const CUSTOM_DATA_KEY: &str = "msal.custom";

/// Storage key prefix for the per-token cached profile response.
pub const GRAPH_CACHE_PREFIX: &str = "msal.msgraph-";

/// Storage key for the profile cached under `access_token`.
pub fn graph_cache_key(access_token: &str) -> String {
    format!("{GRAPH_CACHE_PREFIX}{access_token}")
}

/// Mutable per-page session state owned by the facade.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub access_token: String,
    /// Cached account record from the wrapped client.
    pub user: Option<Account>,
    /// Profile resource fetched from Graph, opaque.
    pub user_details: Option<Value>,
    /// User-managed key/value data, persisted as one blob.
    pub custom: serde_json::Map<String, Value>,
}

impl SessionState {
    /// Rehydrate the custom-data map from storage, defaulting to empty.
    pub fn load_custom(&mut self, store: &dyn StateStore) {
        self.custom = store
            .get_item(CUSTOM_DATA_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(map) => Some(map),
                Err(e) => {
                    warn!("Discarding unreadable custom data: {e}");
                    None
                }
            })
            .unwrap_or_default();
    }

    /// Persist the whole custom-data map; an empty map removes the key.
    pub fn persist_custom(&self, store: &dyn StateStore) {
        if self.custom.is_empty() {
            store.remove_item(CUSTOM_DATA_KEY);
            return;
        }

        match serde_json::to_string(&self.custom) {
            Ok(json) => store.set_item(CUSTOM_DATA_KEY, &json),
            Err(e) => warn!("Failed to persist custom data: {e}"),
        }
    }
}
