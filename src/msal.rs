//! The auth facade.
//!
//! Wraps the external auth client and ties the pieces together: merged
//! configuration, session state, the durable callback queue, token refresh
//! scheduling, custom data and the optional Graph profile fetch.

use crate::bridge::{
    AcquiredToken, AuthClient, Navigation, RedirectOutcome, StateStore, TokenRequest,
};
use crate::config::{Config, MsalOptions};
use crate::error::Error;
use crate::graph::GraphClient;
use crate::queue::{CallbackQueue, EventKind, QueueEntry};
use crate::refresh::{self, RefreshScheduler};
use crate::session::{graph_cache_key, SessionState};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Facade over the wrapped auth client.
///
/// Constructed once per page load; state that must survive a redirect lives
/// in the client's persisted store, everything else in [`SessionState`].
pub struct Msal {
    /// Self-reference handed to user handlers and the refresh timer.
    weak: Weak<Msal>,
    config: Config,
    client: Arc<dyn AuthClient>,
    nav: Arc<dyn Navigation>,
    store: Arc<dyn StateStore>,
    graph: GraphClient,
    session: RwLock<SessionState>,
    queue: CallbackQueue,
    refresh: RefreshScheduler,
}

impl Msal {
    /// Merge options, replay callbacks persisted before the last redirect,
    /// register redirect handlers, and bring the session up to date.
    ///
    /// Fails with [`Error::Config`] when `auth.client_id` is missing.
    pub async fn new(
        options: MsalOptions,
        client: Arc<dyn AuthClient>,
        nav: Arc<dyn Navigation>,
    ) -> Result<Arc<Self>, Error> {
        let config = Config::merge(options, nav.as_ref())?;
        let store = client.store();
        let queue = CallbackQueue::new(Arc::clone(&store));
        let graph = GraphClient::new()?;

        let msal = Arc::new_cyclic(|weak| Self {
            weak: weak.clone(),
            config,
            client,
            nav,
            store,
            graph,
            session: RwLock::new(SessionState::default()),
            queue,
            refresh: RefreshScheduler::new(),
        });

        // Custom data is hydrated first so replayed and construction-time
        // handlers can read it.
        msal.session.write().await.load_custom(msal.store.as_ref());

        // Entries enqueued before a redirect are retried now.
        msal.queue.load();
        msal.execute_callbacks(msal.queue.snapshot()).await;

        // Redirect results are stored for deferred delivery through the
        // queue instead of invoking user code directly.
        let weak = msal.weak.clone();
        msal.client.handle_redirect_callback(Box::new(move |outcome| {
            let Some(msal) = weak.upgrade() else { return };
            let (kind, args) = split_outcome(outcome);
            tokio::spawn(async move {
                msal.save_callback(kind, args).await;
            });
        }));

        if msal.config.auth.require_auth_on_initialize {
            msal.sign_in();
        }

        let authenticated = msal.is_authenticated();
        msal.session.write().await.is_authenticated = authenticated;
        if authenticated {
            msal.session.write().await.user = msal.client.get_account();
            msal.acquire_token().await;
            if msal.config.graph.call_after_init {
                msal.call_ms_graph().await;
            }
        }

        Ok(msal)
    }

    /// The merged configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Snapshot of the current session state.
    pub async fn data(&self) -> SessionState {
        self.session.read().await.clone()
    }

    /// Start an interactive sign-in unless the page is mid-callback or an
    /// account is already cached.
    pub fn sign_in(&self) {
        if !self.client.is_callback(&self.nav.current_hash()) && self.client.get_account().is_none()
        {
            info!("Starting interactive sign-in");
            self.client.login_redirect(&self.config.request);
        }
    }

    /// Await the optional pre-signout hook, then delegate to the client's
    /// logout, which performs its own redirect.
    ///
    /// A hook error propagates and logout is not reached.
    pub async fn sign_out(&self) -> anyhow::Result<()> {
        if let Some(hook) = &self.config.auth.before_sign_out {
            if let Some(this) = self.weak.upgrade() {
                hook(this).await?;
            }
        }
        self.client.logout();
        Ok(())
    }

    /// True iff the page is not processing a redirect callback and the
    /// client has a cached account.
    pub fn is_authenticated(&self) -> bool {
        !self.client.is_callback(&self.nav.current_hash()) && self.client.get_account().is_some()
    }

    /// Acquire a token for the configured request scopes.
    pub async fn acquire_token(&self) -> Option<String> {
        let request = self.config.request.clone();
        self.acquire_token_with(&request).await
    }

    /// Acquire a token, silently first.
    ///
    /// On success the refresh timer is re-armed and the access token
    /// returned. A failure whose code requires interaction triggers a
    /// redirect acquisition (which navigates away); every other failure,
    /// including code-less errors, returns `None` with no navigation.
    ///
    /// Boxed: the scheduled refresh re-enters this method when it fires,
    /// which makes the future recursive.
    pub fn acquire_token_with<'a>(
        &'a self,
        request: &'a TokenRequest,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async move {
            match self.client.acquire_token_silent(request).await {
                Ok(token) => {
                    let access_token = token.access_token.clone();
                    self.set_access_token(token).await;
                    Some(access_token)
                }
                Err(error) => {
                    if error.requires_interaction() {
                        info!(
                            code = error.code.as_deref().unwrap_or_default(),
                            "Silent acquisition needs interaction, redirecting"
                        );
                        self.client.acquire_token_redirect(request);
                    } else {
                        debug!("Silent acquisition failed: {error}");
                    }
                    None
                }
            }
        })
    }

    /// Store the token and arm the refresh timer for its expiry, replacing
    /// any previously armed timer.
    async fn set_access_token(&self, token: AcquiredToken) {
        self.session.write().await.access_token = token.access_token;

        let delay = refresh::delay_until(token.expires_on);
        let scopes = token.scopes;
        let weak = self.weak.clone();
        self.refresh.schedule(delay, async move {
            let Some(msal) = weak.upgrade() else { return };
            if msal.config.auth.auto_refresh_token {
                debug!("Token expired, re-acquiring silently");
                msal.acquire_token_with(&TokenRequest::new(scopes)).await;
            } else {
                msal.session.write().await.access_token.clear();
            }
        });
    }

    /// Fetch the profile resource if an endpoint is configured.
    ///
    /// A response cached under the current access token is used verbatim
    /// without any HTTP request. Fetch failures are logged and abort this
    /// call; a success is delivered through the callback queue.
    pub async fn call_ms_graph(&self) {
        let Some(endpoint) = self.config.graph.me_endpoint.clone() else {
            return;
        };

        let access_token = self.session.read().await.access_token.clone();
        let cache_key = graph_cache_key(&access_token);

        let cached = self.store.get_item(&cache_key).and_then(|raw| {
            match serde_json::from_str::<Value>(&raw) {
                Ok(json) => Some(json),
                Err(e) => {
                    // Treated as a miss; the entry gets overwritten below.
                    warn!("Ignoring unreadable cached profile: {e}");
                    None
                }
            }
        });

        let details = match cached {
            Some(json) => json,
            None => match self.graph.fetch_profile(&endpoint, &access_token).await {
                Ok(profile) => {
                    self.store.set_item(&cache_key, &profile.raw);
                    profile.json
                }
                Err(e) => {
                    warn!("Profile fetch failed: {e}");
                    return;
                }
            },
        };

        self.session.write().await.user_details = Some(details.clone());
        self.save_callback(EventKind::GraphResponse, vec![details]).await;
    }

    /// Set a custom value and persist the whole map.
    pub async fn save_custom_data(&self, key: impl Into<String>, value: Value) {
        let mut session = self.session.write().await;
        session.custom.insert(key.into(), value);
        session.persist_custom(self.store.as_ref());
    }

    /// Remove a custom value; persisting an empty map removes the storage
    /// key entirely.
    pub async fn remove_custom_data(&self, key: &str) {
        let mut session = self.session.write().await;
        session.custom.remove(key);
        session.persist_custom(self.store.as_ref());
    }

    /// A single custom value, if set.
    pub async fn custom_data(&self, key: &str) -> Option<Value> {
        self.session.read().await.custom.get(key).cloned()
    }

    /// Enqueue a callback for `kind` when a handler is configured, persist
    /// the queue, then attempt to execute just the new entry.
    pub async fn save_callback(&self, kind: EventKind, args: Vec<Value>) {
        if self.config.handler(kind).is_none() {
            return;
        }

        let entry = self.queue.push(kind, args);
        self.execute_callbacks(vec![entry]).await;
    }

    /// Execute entries in order, each awaited to completion. Success removes
    /// the entry and re-persists; failure logs a warning and leaves it queued
    /// for a future retry. At-least-once delivery.
    pub async fn execute_callbacks(&self, batch: Vec<QueueEntry>) {
        let Some(this) = self.weak.upgrade() else {
            return;
        };
        for entry in batch {
            let Some(handler) = self.config.handler(entry.id.kind) else {
                warn!("No handler configured for queued callback '{}'", entry.id);
                continue;
            };

            let handler = Arc::clone(handler);
            match handler(Arc::clone(&this), entry.args.clone()).await {
                Ok(()) => self.queue.remove(entry.id),
                Err(e) => warn!("Callback '{}' failed: {e:#}", entry.id),
            }
        }
    }
}

/// Map a redirect result onto its lifecycle event and queued arguments
/// `[error, response]`.
fn split_outcome(outcome: RedirectOutcome) -> (EventKind, Vec<Value>) {
    match outcome {
        RedirectOutcome::Authentication { error, response } => (
            EventKind::Authentication,
            vec![
                error.unwrap_or(Value::Null),
                response.unwrap_or(Value::Null),
            ],
        ),
        RedirectOutcome::Token { error, response } => (
            EventKind::Token,
            vec![
                error.unwrap_or(Value::Null),
                response.unwrap_or(Value::Null),
            ],
        ),
    }
}
