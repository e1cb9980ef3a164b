//! Closed dispatch table over the supported backends.

use async_trait::async_trait;
use gateway_config::ProvidersConfig;
use gateway_core::{
    ChatMessage, GatewayError, GatewayResult, LlmInvoker, Model, Provider, ProviderResponse,
};
use tracing::{debug, info, warn};

use crate::anthropic::AnthropicBackend;
use crate::backend::{BackendConfig, CompletionBackend};
use crate::google::GeminiBackend;
use crate::openai::OpenAIBackend;

/// One optional backend per [`Provider`].
///
/// A provider without a backend fails invocation with
/// [`GatewayError::ProviderNotConfigured`].
#[derive(Debug, Default)]
pub struct ProviderSet {
    openai: Option<OpenAIBackend>,
    anthropic: Option<AnthropicBackend>,
    gemini: Option<GeminiBackend>,
}

impl ProviderSet {
    /// Empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the OpenAI backend
    #[must_use]
    pub fn with_openai(mut self, backend: OpenAIBackend) -> Self {
        self.openai = Some(backend);
        self
    }

    /// Install the Anthropic backend
    #[must_use]
    pub fn with_anthropic(mut self, backend: AnthropicBackend) -> Self {
        self.anthropic = Some(backend);
        self
    }

    /// Install the Gemini backend
    #[must_use]
    pub fn with_gemini(mut self, backend: GeminiBackend) -> Self {
        self.gemini = Some(backend);
        self
    }

    /// Build backends from settings, reading API keys from the process environment
    ///
    /// # Errors
    /// Returns error if a backend cannot be constructed
    pub fn from_env(settings: &ProvidersConfig) -> GatewayResult<Self> {
        Self::from_settings(settings, |name| std::env::var(name).ok())
    }

    /// Build backends from settings, reading API keys through `lookup`.
    ///
    /// Disabled providers and providers whose key is unset are left out.
    ///
    /// # Errors
    /// Returns error if a backend cannot be constructed
    pub fn from_settings<F>(settings: &ProvidersConfig, lookup: F) -> GatewayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut set = Self::new();

        for provider in Provider::ALL {
            let provider_settings = settings.get(provider);
            if !provider_settings.enabled {
                info!(provider = %provider, "Provider disabled by configuration");
                continue;
            }

            let key_env = provider_settings.api_key_env_for(provider);
            let Some(api_key) = lookup(key_env).filter(|k| !k.trim().is_empty()) else {
                warn!(provider = %provider, env = key_env, "API key not set, provider unavailable");
                continue;
            };

            let mut config = BackendConfig::new(api_key)
                .with_timeout(provider_settings.timeout)
                .with_max_tokens(provider_settings.max_tokens);
            if let Some(base_url) = &provider_settings.base_url {
                config = config.with_base_url(base_url.clone());
            }
            if let Some(model) = &provider_settings.default_model {
                config = config.with_default_model(model.clone());
            }

            set = match provider {
                Provider::OpenAI => set.with_openai(OpenAIBackend::new(config)?),
                Provider::Anthropic => set.with_anthropic(AnthropicBackend::new(config)?),
                Provider::Gemini => set.with_gemini(GeminiBackend::new(config)?),
            };
            info!(provider = %provider, "Registered provider");
        }

        Ok(set)
    }

    /// Whether `provider` has a backend
    #[must_use]
    pub fn is_configured(&self, provider: Provider) -> bool {
        self.backend(provider).is_ok()
    }

    /// Providers with a backend
    #[must_use]
    pub fn configured(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.is_configured(*p))
            .collect()
    }

    fn backend(&self, provider: Provider) -> GatewayResult<&dyn CompletionBackend> {
        let backend: Option<&dyn CompletionBackend> = match provider {
            Provider::OpenAI => self.openai.as_ref().map(|b| b as &dyn CompletionBackend),
            Provider::Anthropic => self.anthropic.as_ref().map(|b| b as &dyn CompletionBackend),
            Provider::Gemini => self.gemini.as_ref().map(|b| b as &dyn CompletionBackend),
        };
        backend.ok_or(GatewayError::ProviderNotConfigured { provider })
    }
}

#[async_trait]
impl LlmInvoker for ProviderSet {
    async fn invoke(
        &self,
        history: &[ChatMessage],
        prompt: &str,
        provider: Provider,
        model: Option<Model>,
    ) -> GatewayResult<ProviderResponse> {
        let backend = self.backend(provider)?;
        let model = match model {
            Some(model) => model.as_str(),
            None => backend.default_model(),
        };
        let messages = ChatMessage::conversation(history, prompt);

        debug!(
            provider = %provider,
            model = %model,
            messages = messages.len(),
            "Invoking backend"
        );
        backend.complete(model, &messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn keys(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_settings_skips_missing_keys() {
        let set = ProviderSet::from_settings(
            &ProvidersConfig::default(),
            keys(&[("OPENAI_API_KEY", "sk-1"), ("GEMINI_API_KEY", "  ")]),
        )
        .unwrap();

        assert_eq!(set.configured(), vec![Provider::OpenAI]);
    }

    #[test]
    fn test_from_settings_respects_disabled_and_custom_env() {
        let mut settings = ProvidersConfig::default();
        settings.openai.enabled = false;
        settings.anthropic.api_key_env = Some("CLAUDE_KEY".to_string());

        let set = ProviderSet::from_settings(
            &settings,
            keys(&[("OPENAI_API_KEY", "sk-1"), ("CLAUDE_KEY", "sk-ant")]),
        )
        .unwrap();

        assert!(!set.is_configured(Provider::OpenAI));
        assert!(set.is_configured(Provider::Anthropic));
    }

    #[tokio::test]
    async fn test_invoke_unconfigured_provider() {
        let set = ProviderSet::new();
        let err = set
            .invoke(&[], "hi", Provider::Gemini, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GatewayError::ProviderNotConfigured { provider: Provider::Gemini }
        ));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "gemini provider is not configured");
    }

    #[tokio::test]
    async fn test_invoke_uses_default_model_and_appends_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "What is Rust?"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "A language."}, "finish_reason": "stop"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend =
            OpenAIBackend::new(BackendConfig::new("sk").with_base_url(server.uri())).unwrap();
        let set = ProviderSet::new().with_openai(backend);

        let response = set
            .invoke(&[], "What is Rust?", Provider::OpenAI, None)
            .await
            .unwrap();
        assert_eq!(response.text, "A language.");
        assert_eq!(response.model, "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn test_invoke_forwards_mismatched_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gpt-4:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend =
            GeminiBackend::new(BackendConfig::new("g").with_base_url(server.uri())).unwrap();
        let set = ProviderSet::new().with_gemini(backend);

        let response = set
            .invoke(&[], "hi", Provider::Gemini, Some(Model::Gpt4))
            .await
            .unwrap();
        assert_eq!(response.text, "ok");
    }
}
