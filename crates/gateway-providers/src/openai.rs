//! OpenAI chat completions backend.
//!
//! `POST {base}/chat/completions` with bearer authentication.

use async_trait::async_trait;
use gateway_core::{ChatMessage, GatewayError, GatewayResult, Provider, ProviderResponse, Usage};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{build_client, execute, BackendConfig, CompletionBackend};

/// Public API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used when a request names none
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// OpenAI backend
pub struct OpenAIBackend {
    config: BackendConfig,
    client: Client,
    base_url: String,
    default_model: String,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or the HTTP client cannot be built
    pub fn new(config: BackendConfig) -> GatewayResult<Self> {
        let base_url = config.resolve_base_url(DEFAULT_BASE_URL)?;
        let default_model = config.resolve_default_model(DEFAULT_MODEL);
        let client = build_client(config.timeout)?;

        Ok(Self {
            config,
            client,
            base_url,
            default_model,
        })
    }

    fn transform_request<'a>(model: &'a str, messages: &'a [ChatMessage]) -> OpenAIRequest<'a> {
        OpenAIRequest {
            model,
            messages: messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        }
    }

    fn transform_response(
        response: OpenAIResponse,
        model: &str,
    ) -> GatewayResult<ProviderResponse> {
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            GatewayError::backend(Provider::OpenAI, "No choices in response", None)
        })?;

        let mut result = ProviderResponse::new(
            choice.message.content.unwrap_or_default(),
            response.model.unwrap_or_else(|| model.to_string()),
        );
        if let Some(usage) = response.usage {
            result = result.with_usage(Usage::new(usage.prompt_tokens, usage.completion_tokens));
        }
        if let Some(reason) = choice.finish_reason {
            result = result.with_finish_reason(reason);
        }
        Ok(result)
    }

    fn parse_error(body: &str) -> Option<String> {
        serde_json::from_str::<OpenAIErrorResponse>(body)
            .ok()
            .map(|e| e.error.message)
    }
}

#[async_trait]
impl CompletionBackend for OpenAIBackend {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> GatewayResult<ProviderResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(provider = "openai", model = %model, url = %url, "Sending chat completion request");

        let request = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&Self::transform_request(model, messages));

        let response: OpenAIResponse = execute(Provider::OpenAI, request, Self::parse_error).await?;
        Self::transform_response(response, model)
    }
}

impl std::fmt::Debug for OpenAIBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIBackend")
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .finish_non_exhaustive()
    }
}

// OpenAI API Types

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}
