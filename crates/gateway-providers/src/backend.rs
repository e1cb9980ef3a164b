//! Shared backend plumbing.

use async_trait::async_trait;
use gateway_core::{ChatMessage, GatewayError, GatewayResult, Provider, ProviderResponse};
use reqwest::{Client, RequestBuilder};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{error, trace, warn};
use url::Url;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default completion token limit
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// A single vendor chat completion API
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Vendor served by this backend
    fn provider(&self) -> Provider;

    /// Model used when the request names none
    fn default_model(&self) -> &str;

    /// Run one completion over `messages`
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> GatewayResult<ProviderResponse>;
}

/// Connection settings for one backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API key
    pub api_key: SecretString,
    /// Vendor API base URL override
    pub base_url: Option<String>,
    /// Default model override
    pub default_model: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Completion token limit
    pub max_tokens: u32,
}

impl BackendConfig {
    /// Settings with the given API key and defaults elsewhere
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            base_url: None,
            default_model: None,
            timeout: DEFAULT_TIMEOUT,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the default model
    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the completion token limit
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Base URL to use, without a trailing slash
    pub(crate) fn resolve_base_url(&self, fallback: &str) -> GatewayResult<String> {
        let raw = self.base_url.as_deref().unwrap_or(fallback);
        let parsed = Url::parse(raw)
            .map_err(|e| GatewayError::configuration(format!("Invalid base URL '{raw}': {e}")))?;
        Ok(parsed.as_str().trim_end_matches('/').to_string())
    }

    pub(crate) fn resolve_default_model(&self, fallback: &str) -> String {
        self.default_model
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Build the HTTP client for a backend
pub(crate) fn build_client(timeout: Duration) -> GatewayResult<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(100)
        .build()
        .map_err(|e| GatewayError::internal(format!("Failed to create HTTP client: {e}")))
}

/// Send `request` and decode a 2xx JSON body.
///
/// Non-2xx responses become a backend error carrying the vendor message that
/// `vendor_message` extracts, or `HTTP <status>: <body>` when it finds none.
pub(crate) async fn execute<R: DeserializeOwned>(
    provider: Provider,
    request: RequestBuilder,
    vendor_message: fn(&str) -> Option<String>,
) -> GatewayResult<R> {
    // Transport errors render the request URL, which may carry an API key
    let response = request.send().await.map_err(|e| {
        let e = e.without_url();
        error!(provider = %provider, error = %e, "Backend request failed");
        GatewayError::backend(provider, format!("Request failed: {e}"), None)
    })?;

    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| {
        let e = e.without_url();
        GatewayError::backend(provider, format!("Failed to read response: {e}"), Some(status))
    })?;

    trace!(provider = %provider, status, body = %body, "Received backend response");

    if !(200..300).contains(&status) {
        let message = vendor_message(&body)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP {status}: {body}"));
        warn!(provider = %provider, status, message = %message, "Backend returned an error");
        return Err(GatewayError::backend(provider, message, Some(status)));
    }

    serde_json::from_str(&body).map_err(|e| {
        GatewayError::backend(provider, format!("Invalid response JSON: {e}"), Some(status))
    })
}
