//! Microsoft Graph profile fetch.
//!
//! One authenticated GET against the configured profile endpoint. The
//! response body is kept opaque; callers cache and forward it as-is.

use crate::error::{Error, GraphError};
use serde_json::Value;
use std::time::Duration;

/// HTTP request timeout.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// HTTP connection timeout.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Profile response: the raw body (cached per access token) plus its parsed
/// JSON form (stored as the session's user details).
#[derive(Debug, Clone)]
pub struct ProfileResponse {
    pub raw: String,
    pub json: Value,
}

/// Minimal Graph client for the profile resource.
pub struct GraphClient {
    http_client: reqwest::Client,
}

impl GraphClient {
    pub fn new() -> Result<Self, Error> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self { http_client })
    }

    /// Fetch the profile resource with a bearer token.
    pub async fn fetch_profile(
        &self,
        endpoint: &str,
        access_token: &str,
    ) -> Result<ProfileResponse, GraphError> {
        let response = self
            .http_client
            .get(endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GraphError::RequestFailed(e.to_string()))?;

        match response.status().as_u16() {
            200 => {
                let raw = response
                    .text()
                    .await
                    .map_err(|e| GraphError::ParseFailed(e.to_string()))?;
                let json: Value = serde_json::from_str(&raw)
                    .map_err(|e| GraphError::ParseFailed(e.to_string()))?;
                Ok(ProfileResponse { raw, json })
            }
            401 => Err(GraphError::Unauthorized),
            403 => Err(GraphError::Forbidden),
            429 => Err(GraphError::RateLimited),
            // Don't expose raw API error details - just the status code
            status => Err(GraphError::RequestFailed(format!("HTTP {}", status))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds() {
        assert!(GraphClient::new().is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_failure() {
        let client = GraphClient::new().unwrap();
        // Discard-port style address nothing listens on.
        let result = client.fetch_profile("http://127.0.0.1:9/me", "token").await;
        assert!(matches!(result, Err(GraphError::RequestFailed(_))));
    }
}
