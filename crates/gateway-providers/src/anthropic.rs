//! Anthropic Messages API backend.
//!
//! `POST {base}/v1/messages`. System messages are lifted into the top-level
//! `system` field since the API only accepts `user` and `assistant` turns.

use async_trait::async_trait;
use gateway_core::{
    ChatMessage, GatewayError, GatewayResult, MessageRole, Provider, ProviderResponse, Usage,
};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{build_client, execute, BackendConfig, CompletionBackend};

/// Public API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Model used when a request names none
pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";

/// Value sent in the `anthropic-version` header
pub const API_VERSION: &str = "2023-06-01";

/// Anthropic backend
pub struct AnthropicBackend {
    config: BackendConfig,
    client: Client,
    base_url: String,
    default_model: String,
}

impl AnthropicBackend {
    /// Create a new Anthropic backend
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

    fn transform_request<'a>(
        &self,
        model: &'a str,
        messages: &'a [ChatMessage],
    ) -> AnthropicRequest<'a> {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();

        AnthropicRequest {
            model,
            max_tokens: self.config.max_tokens,
            system: if system.is_empty() {
                None
            } else {
                Some(system.join("\n"))
            },
            messages: messages
                .iter()
                .filter(|m| m.role != MessageRole::System)
                .map(|m| AnthropicMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        }
    }

    fn transform_response(response: AnthropicResponse, model: &str) -> ProviderResponse {
        let text = response
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<String>();

        let mut result =
            ProviderResponse::new(text, response.model.unwrap_or_else(|| model.to_string()));
        if let Some(usage) = response.usage {
            result = result.with_usage(Usage::new(usage.input_tokens, usage.output_tokens));
        }
        if let Some(reason) = response.stop_reason {
            result = result.with_finish_reason(reason);
        }
        result
    }

    fn parse_error(body: &str) -> Option<String> {
        serde_json::from_str::<AnthropicErrorResponse>(body)
            .ok()
            .map(|e| e.error.message)
    }
}

#[async_trait]
impl CompletionBackend for AnthropicBackend {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> GatewayResult<ProviderResponse> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(provider = "anthropic", model = %model, url = %url, "Sending messages request");

        let request = self
            .client
            .post(&url)
            .header("x-api-key", self.config.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&self.transform_request(model, messages));

        let response: AnthropicResponse =
            execute(Provider::Anthropic, request, Self::parse_error).await?;
        if response.content.is_empty() {
            return Err(GatewayError::backend(
                Provider::Anthropic,
                "No content in response",
                None,
            ));
        }
        Ok(Self::transform_response(response, model))
    }
}

impl std::fmt::Debug for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicBackend")
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("max_tokens", &self.config.max_tokens)
            .finish_non_exhaustive()
    }
}

// Anthropic API Types

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> AnthropicBackend {
        AnthropicBackend::new(
            BackendConfig::new("test-key")
                .with_base_url(server.uri())
                .with_max_tokens(256),
        )
        .unwrap()
    }

    #[test]
    fn test_system_messages_are_lifted() {
        let backend = AnthropicBackend::new(BackendConfig::new("k")).unwrap();
        let reply = ChatMessage {
            role: MessageRole::Assistant,
            content: "ok".to_string(),
        };
        let messages = ChatMessage::conversation(&[ChatMessage::system("be brief"), reply], "hi");
        let json =
            serde_json::to_value(backend.transform_request(DEFAULT_MODEL, &messages)).unwrap();

        assert_eq!(json["system"], "be brief");
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", API_VERSION))
            .and(body_partial_json(json!({"model": DEFAULT_MODEL, "max_tokens": 256})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "model": DEFAULT_MODEL,
                "content": [{"type": "text", "text": "Hello"}, {"type": "text", "text": " there"}],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 10, "output_tokens": 4}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = backend(&server)
            .complete(DEFAULT_MODEL, &[ChatMessage::user("Hi")])
            .await
            .unwrap();

        assert_eq!(response.text, "Hello there");
        assert_eq!(response.total_tokens(), 14);
        assert_eq!(response.finish_reason.as_deref(), Some("end_turn"));
    }

    #[tokio::test]
    async fn test_complete_vendor_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_json(json!({
                "type": "error",
                "error": {"type": "overloaded_error", "message": "Overloaded"}
            })))
            .mount(&server)
            .await;

        let err = backend(&server)
            .complete(DEFAULT_MODEL, &[ChatMessage::user("Hi")])
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Overloaded");
        assert_eq!(err.provider(), Some(Provider::Anthropic));
    }

    #[tokio::test]
    async fn test_complete_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
            .mount(&server)
            .await;

        let err = backend(&server)
            .complete(DEFAULT_MODEL, &[ChatMessage::user("Hi")])
            .await
            .unwrap_err();

        assert_eq!(err.message(), "No content in response");
    }
}
