//! Seams for the external collaborators: the wrapped auth client, its
//! key/value store, and the current navigation context.
//!
//! The wrapped library owns the actual OAuth redirect/silent-renew state
//! machine, token cache and cross-tab synchronization. This crate only talks
//! to it through these traits, so hosts and tests can substitute their own
//! implementations.

use crate::error::TokenError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Account record returned by the underlying client.
///
/// Only a few well-known fields are typed; everything else the provider
/// returns is carried opaquely in `claims`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub claims: serde_json::Map<String, Value>,
}

/// Scopes requested on login or token acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub scopes: Vec<String>,
}

impl TokenRequest {
    pub fn new(scopes: Vec<String>) -> Self {
        Self { scopes }
    }
}

/// Result of a successful silent token acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquiredToken {
    pub access_token: String,
    pub expires_on: DateTime<Utc>,
    pub scopes: Vec<String>,
}

/// Result delivered by the wrapped client when the page returns from an
/// identity-provider redirect.
#[derive(Debug, Clone)]
pub enum RedirectOutcome {
    /// Authentication (login) result, success or error.
    Authentication {
        error: Option<Value>,
        response: Option<Value>,
    },
    /// Token acquisition result, success or error.
    Token {
        error: Option<Value>,
        response: Option<Value>,
    },
}

/// Handler registered with the wrapped client for redirect results.
pub type RedirectHandler = Box<dyn Fn(RedirectOutcome) + Send + Sync>;

/// The wrapped browser authentication client.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Start an interactive redirect sign-in. Navigates away; does not return
    /// a result to the caller.
    fn login_redirect(&self, request: &TokenRequest);

    /// Sign out. Performs its own redirect.
    fn logout(&self);

    /// The currently cached account, if any.
    fn get_account(&self) -> Option<Account>;

    /// Whether the given location hash is an auth redirect callback being
    /// processed by the client.
    fn is_callback(&self, hash: &str) -> bool;

    /// Obtain a token from cache or silent renew, without user interaction.
    async fn acquire_token_silent(
        &self,
        request: &TokenRequest,
    ) -> Result<AcquiredToken, TokenError>;

    /// Obtain a token through an interactive redirect. Navigates away.
    fn acquire_token_redirect(&self, request: &TokenRequest);

    /// Register a handler invoked when the page resumes from a redirect.
    fn handle_redirect_callback(&self, handler: RedirectHandler);

    /// The client's persisted key/value store, backed by browser storage.
    fn store(&self) -> Arc<dyn StateStore>;
}

/// Browser-storage shaped key/value store exposed by the wrapped client.
pub trait StateStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// Current navigation context (URL and hash).
///
/// Injected rather than read from a global so tests can simulate pre- and
/// post-redirect states without a real browser.
pub trait Navigation: Send + Sync {
    /// The full current URL, used as the default redirect URI.
    fn current_url(&self) -> String;

    /// The current location hash, checked for redirect callbacks.
    fn current_hash(&self) -> String;
}

/// In-process [`StateStore`] for tests and non-browser hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().expect("store lock poisoned").get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .lock()
            .expect("store lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.items.lock().expect("store lock poisoned").remove(key);
    }
}
