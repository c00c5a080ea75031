//! HTTP transport for the AlgoArena identity service.
//!
//! `ApiClient` keeps the session credential in a cookie jar shared by every
//! request it issues; callers never see or handle the credential directly.
//! Everything above this layer talks to the `Transport` trait so the auth
//! manager can be driven by a scripted fake in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde_json::Value;
use tracing::debug;

use super::{ApiError, ApiResponse};

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the identity service
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1/";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Endpoint paths, relative to the base URL.
pub mod endpoints {
    pub const IDENTITY_CHECK: &str = "auth/check";
    pub const TOKEN_REFRESH: &str = "refresh-token";
    pub const REGISTER: &str = "auth/register";
    pub const VERIFY_ACCOUNT: &str = "auth/verify-account";
    pub const LOGIN: &str = "auth/login";
    pub const FORGOT_PASSWORD: &str = "auth/forgot-password";
    pub const RESET_PASSWORD: &str = "auth/reset-password";
    pub const SOCIAL_AUTH: &str = "auth/social-auth";
    pub const LOGOUT: &str = "auth/logout";
}

/// A credentialed request issuer with a uniform response/error shape.
///
/// Implementations attach the credential themselves and never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<ApiResponse, ApiError>;

    async fn post(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError>;
}

/// API client for the identity service.
/// Clone is cheap - reqwest::Client uses Arc internally, so clones share the
/// connection pool and the cookie jar.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client against `base_url` with the given timeout.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let base_url = Self::parse_base_url(base_url)?;
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Parse the base URL, making sure it ends with a slash so relative
    /// endpoint paths are appended rather than replacing the last segment.
    fn parse_base_url(base_url: &str) -> Result<Url, ApiError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        Url::parse(&normalized)
            .map_err(|e| ApiError::InvalidResponse(format!("Invalid base URL {}: {}", base_url, e)))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidResponse(format!("Invalid endpoint {}: {}", path, e)))
    }

    /// Check if response is successful, converting the status and body into
    /// a classified error if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_envelope(response: reqwest::Response) -> Result<ApiResponse, ApiError> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(ApiResponse {
                success: true,
                message: None,
                data: None,
            });
        }
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response envelope: {}", e)))
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        let url = self.url(path)?;
        debug!(endpoint = path, "GET");

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_envelope(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        let url = self.url(path)?;
        debug!(endpoint = path, "POST");

        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_envelope(response).await
    }
}
