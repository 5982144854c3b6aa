//! msal-kit - convenience layer around an MSAL-style browser auth client.
//!
//! The wrapped client owns the OAuth redirect and silent-renew protocol
//! machinery; this crate adds what applications keep rebuilding on top of it:
//!
//! - a durable, at-least-once queue of lifecycle callbacks that survives
//!   full-page redirects,
//! - automatic token refresh scheduling at expiry,
//! - a persisted custom key/value map scoped to the wrapper,
//! - an optional authenticated profile fetch (Microsoft Graph `/me`).
//!
//! Hosts implement [`bridge::AuthClient`] and [`bridge::Navigation`] for
//! their platform and construct the [`Msal`] facade from [`MsalOptions`].

#![deny(clippy::all)]

pub mod bridge;
pub mod config;
pub mod error;
pub mod graph;
pub mod msal;
pub mod queue;
pub mod refresh;
pub mod session;

pub use bridge::{
    Account, AcquiredToken, AuthClient, MemoryStore, Navigation, RedirectHandler, RedirectOutcome,
    StateStore, TokenRequest,
};
pub use config::{
    AuthOptions, CacheLocation, CacheOptions, Config, EventHandler, GraphOptions, HandlerFuture,
    MsalOptions, RequestOptions, SignOutHook,
};
pub use error::{Error, GraphError, TokenError};
pub use msal::Msal;
pub use queue::{CallbackId, EventKind, QueueEntry};
pub use session::SessionState;
