//! Error types for msal-kit.
//!
//! Uses `thiserror` for library-style errors with automatic `Display` and `Error` implementations.

use thiserror::Error;

/// Top-level library error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Graph profile fetch errors.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Graph request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse Graph response: {0}")]
    ParseFailed(String),

    #[error("Unauthorized (401): Token may be expired")]
    Unauthorized,

    #[error("Forbidden (403): Insufficient permissions")]
    Forbidden,

    #[error("Rate limited (429): Too many requests")]
    RateLimited,
}

/// Error reported by the underlying auth client on token acquisition.
///
/// The optional `code` carries the provider error code (e.g. `login_required`)
/// used to decide whether interactive sign-in is required.
#[derive(Error, Debug, Clone)]
#[error("Token acquisition failed: {message}")]
pub struct TokenError {
    pub code: Option<String>,
    pub message: String,
}

impl TokenError {
    /// Error with a provider error code.
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Error carrying no provider error code.
    pub fn without_code(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Whether this failure can only be resolved by interactive sign-in.
    ///
    /// Errors without a code are never treated as requiring interaction.
    pub fn requires_interaction(&self) -> bool {
        matches!(
            self.code.as_deref(),
            Some("consent_required") | Some("interaction_required") | Some("login_required")
        )
    }
}
