//! Backend REST API client
//!
//! This module wraps the Vinsmoke backend REST API: one shared HTTP client
//! with normalized error handling, plus typed surfaces for the public,
//! session and admin endpoint families.

pub mod admin;
pub mod public;
pub mod session;

pub use admin::{AdminApi, ChangeOp, EntityKind};
pub use public::PublicApi;
pub use session::{LinkSessionResponse, SessionApi};

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::utils::errors::{Result, VinsmokeError};

/// Distinguished error code the backend emits while the pairing service
/// is degraded
pub const MAINTENANCE_MODE: &str = "MAINTENANCE_MODE";

/// Standard `{success, error?, message?}` response envelope
#[derive(Debug, Clone, Deserialize)]
struct ApiEnvelope {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn default_success() -> bool {
    true
}

/// Shared HTTP client for the backend REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new ApiClient instance
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("Vinsmoke-Console/1.0")
            .build()
            .map_err(VinsmokeError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request and parse the JSON body after envelope checks
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        headers: Option<HeaderMap>,
    ) -> Result<T> {
        let value = self.request_value(method, path, body, headers).await?;
        serde_json::from_value(value).map_err(VinsmokeError::Serialization)
    }

    /// Issue a request and return the raw response bytes (file downloads)
    pub async fn request_bytes(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
    ) -> Result<Vec<u8>> {
        let response = self.send(method, path, None, headers).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.normalize_status(status, response).await);
        }
        Ok(response.bytes().await.map_err(VinsmokeError::Http)?.to_vec())
    }

    async fn request_value(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        headers: Option<HeaderMap>,
    ) -> Result<serde_json::Value> {
        let response = self.send(method, path, body, headers).await?;
        let status = response.status();

        if !status.is_success() {
            return Err(self.normalize_status(status, response).await);
        }

        let value: serde_json::Value = response.json().await.map_err(VinsmokeError::Http)?;

        // A 200 body can still carry a failure envelope
        if let Ok(envelope) = serde_json::from_value::<ApiEnvelope>(value.clone()) {
            if !envelope.success {
                let code = envelope.error.unwrap_or_default();
                let message = envelope.message.unwrap_or_else(|| code.clone());
                if code == MAINTENANCE_MODE {
                    return Err(VinsmokeError::Maintenance(message));
                }
                return Err(VinsmokeError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
        }

        Ok(value)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        headers: Option<HeaderMap>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::new_v4();
        debug!(method = %method, url = %url, request_id = %request_id, "Issuing API request");

        let mut builder = self.client.request(method, &url);
        if let Some(headers) = headers {
            builder = builder.headers(headers);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(url = %url, request_id = %request_id, error = %e, "Transport failure");
            VinsmokeError::Http(e)
        })?;

        debug!(url = %url, request_id = %request_id, status = %response.status(), "API response received");
        Ok(response)
    }

    /// Map non-2xx statuses onto the error taxonomy
    async fn normalize_status(
        &self,
        status: StatusCode,
        response: reqwest::Response,
    ) -> VinsmokeError {
        let body = response.text().await.unwrap_or_default();
        let envelope: Option<ApiEnvelope> = serde_json::from_str(&body).ok();
        let message = envelope
            .as_ref()
            .and_then(|e| e.message.clone().or_else(|| e.error.clone()))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        match status {
            StatusCode::UNAUTHORIZED => VinsmokeError::AuthExpired,
            StatusCode::FORBIDDEN => VinsmokeError::AccessDenied(message),
            StatusCode::SERVICE_UNAVAILABLE => VinsmokeError::Maintenance(message),
            _ => {
                if envelope.as_ref().and_then(|e| e.error.as_deref()) == Some(MAINTENANCE_MODE) {
                    VinsmokeError::Maintenance(message)
                } else {
                    VinsmokeError::Api {
                        status: status.as_u16(),
                        message,
                    }
                }
            }
        }
    }
}

/// Build the header set attached to authenticated admin calls
pub fn bearer_headers(token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| VinsmokeError::InvalidInput("Token is not header-safe".to_string()))?;
    headers.insert(reqwest::header::AUTHORIZATION, value);
    headers.insert(
        "X-Requested-With",
        HeaderValue::from_static("XMLHttpRequest"),
    );
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_defaults_to_success() {
        let envelope: ApiEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.success);
    }

    #[test]
    fn test_envelope_failure_with_code() {
        let envelope: ApiEnvelope =
            serde_json::from_str(r#"{"success": false, "error": "MAINTENANCE_MODE"}"#).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some(MAINTENANCE_MODE));
    }

    #[test]
    fn test_bearer_headers_shape() {
        let headers = bearer_headers("abc123").unwrap();
        assert_eq!(
            headers.get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer abc123"
        );
        assert_eq!(headers.get("X-Requested-With").unwrap(), "XMLHttpRequest");
    }
}
