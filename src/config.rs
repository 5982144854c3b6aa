//! Configuration merging.
//!
//! User-supplied [`MsalOptions`] are shallow-merged with built-in defaults
//! into four sub-configurations (auth, cache, request, graph). A user-provided
//! key fully replaces the default value; there is no deep merge.

use crate::bridge::{Navigation, TokenRequest};
use crate::error::Error;
use crate::msal::Msal;
use crate::queue::EventKind;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use url::Url;

/// Default tenant for multi-tenant apps.
const DEFAULT_TENANT_ID: &str = "common";
/// Default identity-provider host.
const DEFAULT_TENANT_NAME: &str = "login.microsoftonline.com";
/// Default scope requested on login and token acquisition.
const DEFAULT_SCOPE: &str = "user.read";
/// Default profile resource.
const DEFAULT_ME_ENDPOINT: &str = "https://graph.microsoft.com/v1.0/me";

/// Future returned by user handlers and hooks.
pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A user handler for one lifecycle event.
///
/// Invoked with the facade instance plus the arguments captured when the
/// event fired. A returned error leaves the queued entry in place for retry,
/// so handlers must be idempotent or deduplicate on their arguments.
pub type EventHandler = Arc<dyn Fn(Arc<Msal>, Vec<Value>) -> HandlerFuture + Send + Sync>;

/// Hook awaited before delegating sign-out to the wrapped client.
pub type SignOutHook = Arc<dyn Fn(Arc<Msal>) -> HandlerFuture + Send + Sync>;

/// Where the wrapped client keeps its auth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLocation {
    LocalStorage,
    SessionStorage,
}

/// User-supplied construction options. Every field is optional except
/// `auth.client_id`.
#[derive(Default)]
pub struct MsalOptions {
    pub auth: AuthOptions,
    pub cache: CacheOptions,
    pub request: RequestOptions,
    pub graph: GraphOptions,
}

#[derive(Default)]
pub struct AuthOptions {
    /// Application (client) ID. Required.
    pub client_id: String,
    pub tenant_id: Option<String>,
    pub tenant_name: Option<String>,
    pub redirect_uri: Option<String>,
    pub post_logout_redirect_uri: Option<String>,
    pub navigate_to_login_request_url: Option<bool>,
    /// Trigger `sign_in` during construction.
    pub require_auth_on_initialize: Option<bool>,
    /// Re-acquire silently when the scheduled expiry fires.
    pub auto_refresh_token: Option<bool>,
    pub on_authentication: Option<EventHandler>,
    pub on_token: Option<EventHandler>,
    pub before_sign_out: Option<SignOutHook>,
}

#[derive(Default)]
pub struct CacheOptions {
    pub cache_location: Option<CacheLocation>,
    pub store_auth_state_in_cookie: Option<bool>,
}

#[derive(Default)]
pub struct RequestOptions {
    pub scopes: Option<Vec<String>>,
}

#[derive(Default)]
pub struct GraphOptions {
    /// Fetch the profile right after an authenticated construction.
    pub call_after_init: Option<bool>,
    pub me_endpoint: Option<String>,
    pub on_response: Option<EventHandler>,
}

/// Merged configuration consumed by the facade.
#[derive(Clone)]
pub struct Config {
    pub auth: AuthConfig,
    pub cache: CacheConfig,
    pub request: TokenRequest,
    pub graph: GraphConfig,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub tenant_id: String,
    pub tenant_name: String,
    pub redirect_uri: String,
    pub post_logout_redirect_uri: String,
    pub navigate_to_login_request_url: bool,
    pub require_auth_on_initialize: bool,
    pub auto_refresh_token: bool,
    pub on_authentication: Option<EventHandler>,
    pub on_token: Option<EventHandler>,
    pub before_sign_out: Option<SignOutHook>,
}

/// Merged cache settings.
///
/// Pass-through only: the wrapped client owns its cache, so hosts read these
/// fields (together with [`Config::authority`]) when constructing it. Nothing
/// in this crate consumes them after the merge.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub cache_location: CacheLocation,
    pub store_auth_state_in_cookie: bool,
}

#[derive(Clone)]
pub struct GraphConfig {
    pub call_after_init: bool,
    pub me_endpoint: Option<String>,
    pub on_response: Option<EventHandler>,
}

impl Config {
    /// Merge user options with defaults.
    ///
    /// Fails with [`Error::Config`] before any other work when
    /// `auth.client_id` is missing, or when a configured URL does not parse.
    pub fn merge(options: MsalOptions, nav: &dyn Navigation) -> Result<Self, Error> {
        if options.auth.client_id.is_empty() {
            return Err(Error::Config("auth.client_id is required".into()));
        }

        let current_url = nav.current_url();
        let auth = AuthConfig {
            client_id: options.auth.client_id,
            tenant_id: options
                .auth
                .tenant_id
                .unwrap_or_else(|| DEFAULT_TENANT_ID.into()),
            tenant_name: options
                .auth
                .tenant_name
                .unwrap_or_else(|| DEFAULT_TENANT_NAME.into()),
            redirect_uri: options.auth.redirect_uri.unwrap_or_else(|| current_url.clone()),
            post_logout_redirect_uri: options
                .auth
                .post_logout_redirect_uri
                .unwrap_or(current_url),
            navigate_to_login_request_url: options.auth.navigate_to_login_request_url.unwrap_or(true),
            require_auth_on_initialize: options.auth.require_auth_on_initialize.unwrap_or(false),
            auto_refresh_token: options.auth.auto_refresh_token.unwrap_or(true),
            on_authentication: options.auth.on_authentication,
            on_token: options.auth.on_token,
            before_sign_out: options.auth.before_sign_out,
        };

        let cache = CacheConfig {
            cache_location: options
                .cache
                .cache_location
                .unwrap_or(CacheLocation::LocalStorage),
            store_auth_state_in_cookie: options.cache.store_auth_state_in_cookie.unwrap_or(true),
        };

        let request = TokenRequest::new(
            options
                .request
                .scopes
                .unwrap_or_else(|| vec![DEFAULT_SCOPE.into()]),
        );

        let graph = GraphConfig {
            call_after_init: options.graph.call_after_init.unwrap_or(false),
            me_endpoint: Some(
                options
                    .graph
                    .me_endpoint
                    .unwrap_or_else(|| DEFAULT_ME_ENDPOINT.into()),
            ),
            on_response: options.graph.on_response,
        };

        let config = Self {
            auth,
            cache,
            request,
            graph,
        };
        config.validate()?;

        Ok(config)
    }

    /// Validate configured URLs.
    fn validate(&self) -> Result<(), Error> {
        Url::parse(&self.auth.redirect_uri)
            .map_err(|e| Error::Config(format!("invalid auth.redirect_uri: {e}")))?;

        if let Some(endpoint) = &self.graph.me_endpoint {
            Url::parse(endpoint)
                .map_err(|e| Error::Config(format!("invalid graph.me_endpoint: {e}")))?;
        }

        Ok(())
    }

    /// Authority URL for hosts constructing the wrapped client.
    pub fn authority(&self) -> String {
        format!("https://{}/{}", self.auth.tenant_name, self.auth.tenant_id)
    }

    /// The configured handler for a lifecycle event, if any.
    pub fn handler(&self, kind: EventKind) -> Option<&EventHandler> {
        match kind {
            EventKind::Authentication => self.auth.on_authentication.as_ref(),
            EventKind::Token => self.auth.on_token.as_ref(),
            EventKind::GraphResponse => self.graph.on_response.as_ref(),
        }
    }
}
