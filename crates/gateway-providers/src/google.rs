//! Google Gemini backend.
//!
//! Uses the Google AI Studio API:
//! `POST {base}/models/{MODEL}:generateContent?key={API_KEY}`

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
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when a request names none
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Gemini backend
pub struct GeminiBackend {
    config: BackendConfig,
    client: Client,
    base_url: String,
    default_model: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend
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

    /// Endpoint for `model`, without the key
    fn endpoint_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn transform_request(&self, messages: &[ChatMessage]) -> GoogleRequest {
        let mut contents = Vec::with_capacity(messages.len());
        let mut system_parts = Vec::new();

        for message in messages {
            match message.role {
                MessageRole::System => system_parts.push(GooglePart {
                    text: message.content.clone(),
                }),
                MessageRole::User | MessageRole::Assistant => contents.push(GoogleContent {
                    role: Some(Self::map_role(message.role).to_string()),
                    parts: vec![GooglePart {
                        text: message.content.clone(),
                    }],
                }),
            }
        }

        GoogleRequest {
            contents,
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(GoogleContent {
                    role: None,
                    parts: system_parts,
                })
            },
            generation_config: Some(GoogleGenerationConfig {
                max_output_tokens: Some(self.config.max_tokens),
            }),
        }
    }

    /// Gemini calls the assistant turn `model`
    const fn map_role(role: MessageRole) -> &'static str {
        match role {
            MessageRole::Assistant => "model",
            MessageRole::User | MessageRole::System => "user",
        }
    }

    fn transform_response(
        response: GoogleResponse,
        model: &str,
    ) -> GatewayResult<ProviderResponse> {
        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            GatewayError::backend(Provider::Gemini, "No candidates in response", None)
        })?;

        let text = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        let mut result = ProviderResponse::new(
            text,
            response.model_version.unwrap_or_else(|| model.to_string()),
        );
        if let Some(usage) = response.usage_metadata {
            result = result.with_usage(Usage::new(
                usage.prompt_token_count,
                usage.candidates_token_count.unwrap_or(0),
            ));
        }
        if let Some(reason) = candidate.finish_reason {
            result = result.with_finish_reason(reason);
        }
        Ok(result)
    }

    fn parse_error(body: &str) -> Option<String> {
        serde_json::from_str::<GoogleErrorResponse>(body)
            .ok()
            .map(|e| e.error.message)
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> GatewayResult<ProviderResponse> {
        let url = self.endpoint_url(model);
        debug!(provider = "gemini", model = %model, url = %url, "Sending generateContent request");

        let request = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.expose_secret().as_str())])
            .json(&self.transform_request(messages));

        let response: GoogleResponse = execute(Provider::Gemini, request, Self::parse_error).await?;
        Self::transform_response(response, model)
    }
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .finish_non_exhaustive()
    }
}

// Google API Types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleRequest {
    contents: Vec<GoogleContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GoogleContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GoogleGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GoogleContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GooglePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
    #[serde(default)]
    usage_metadata: Option<GoogleUsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleCandidate {
    #[serde(default)]
    content: Option<GoogleContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> GeminiBackend {
        GeminiBackend::new(BackendConfig::new("test-key").with_base_url(server.uri())).unwrap()
    }

    #[test]
    fn test_endpoint_url() {
        let backend = GeminiBackend::new(BackendConfig::new("test-key")).unwrap();
        let url = backend.endpoint_url("gemini-1.5-pro");

        assert!(url.starts_with("https://generativelanguage.googleapis.com/v1beta/models/"));
        assert!(url.ends_with("gemini-1.5-pro:generateContent"));
        assert!(!url.contains("test-key"));
    }

    #[test]
    fn test_map_role() {
        assert_eq!(GeminiBackend::map_role(MessageRole::Assistant), "model");
        assert_eq!(GeminiBackend::map_role(MessageRole::User), "user");
    }

    #[test]
    fn test_transform_request() {
        let backend = GeminiBackend::new(BackendConfig::new("k").with_max_tokens(64)).unwrap();
        let messages = ChatMessage::conversation(&[ChatMessage::system("be brief")], "hi");
        let json = serde_json::to_value(backend.transform_request(&messages)).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 64);
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Hi from Gemini"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {
                    "promptTokenCount": 5,
                    "candidatesTokenCount": 4,
                    "totalTokenCount": 9
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = backend(&server)
            .complete("gemini-1.5-pro", &[ChatMessage::user("Hi")])
            .await
            .unwrap();

        assert_eq!(response.text, "Hi from Gemini");
        assert_eq!(response.model, "gemini-1.5-pro");
        assert_eq!(response.total_tokens(), 9);
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
    }

    #[tokio::test]
    async fn test_complete_vendor_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gpt-4:generateContent"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {
                    "code": 404,
                    "message": "models/gpt-4 is not found",
                    "status": "NOT_FOUND"
                }
            })))
            .mount(&server)
            .await;

        let err = backend(&server)
            .complete("gpt-4", &[ChatMessage::user("Hi")])
            .await
            .unwrap_err();

        assert_eq!(err.message(), "models/gpt-4 is not found");
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_complete_no_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = backend(&server)
            .complete("gemini-1.5-pro", &[ChatMessage::user("Hi")])
            .await
            .unwrap_err();

        assert_eq!(err.message(), "No candidates in response");
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let backend = GeminiBackend::new(
            BackendConfig::new("gemini-secret-key").with_base_url("http://127.0.0.1:1"),
        )
        .unwrap();

        let err = backend
            .complete("gemini-1.5-pro", &[ChatMessage::user("Hi")])
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 500);
        assert!(err.message().starts_with("Request failed:"));
        assert!(!err.message().contains("gemini-secret-key"));
        assert!(!err.message().contains("key="));
    }
}
