//! Configuration types.

use gateway_core::Provider;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::error::ConfigError;

/// Root gateway configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server settings
    #[validate(nested)]
    pub server: ServerSettings,
    /// Backend settings
    #[validate(nested)]
    pub providers: ProvidersConfig,
    /// Provider selection settings
    pub routing: RoutingSettings,
    /// Logging, request log and metrics settings
    #[validate(nested)]
    pub telemetry: TelemetrySettings,
}

impl GatewayConfig {
    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`ConfigError::Validation`] listing every invalid field
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate().map_err(ConfigError::from)
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address
    #[validate(length(min = 1))]
    pub host: String,
    /// Bind port
    #[validate(range(min = 1))]
    pub port: u16,
    /// Maximum request body size in bytes
    #[validate(range(min = 1))]
    pub body_limit: usize,
    /// Grace period for in-flight requests on shutdown
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            body_limit: 1024 * 1024,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Per-provider backend settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProvidersConfig {
    /// OpenAI settings
    #[validate(nested)]
    pub openai: ProviderSettings,
    /// Anthropic settings
    #[validate(nested)]
    pub anthropic: ProviderSettings,
    /// Gemini settings
    #[validate(nested)]
    pub gemini: ProviderSettings,
}

impl ProvidersConfig {
    /// Settings for `provider`
    #[must_use]
    pub fn get(&self, provider: Provider) -> &ProviderSettings {
        match provider {
            Provider::OpenAI => &self.openai,
            Provider::Anthropic => &self.anthropic,
            Provider::Gemini => &self.gemini,
        }
    }
}

/// Settings for one backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProviderSettings {
    /// Whether the backend may be invoked
    pub enabled: bool,
    /// Environment variable holding the API key
    #[validate(length(min = 1))]
    pub api_key_env: Option<String>,
    /// Override of the vendor API base URL
    #[validate(url)]
    pub base_url: Option<String>,
    /// Model used when a request names none
    #[validate(length(min = 1))]
    pub default_model: Option<String>,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Completion token limit (Anthropic requires one)
    #[validate(range(min = 1))]
    pub max_tokens: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: None,
            base_url: None,
            default_model: None,
            timeout: Duration::from_secs(120),
            max_tokens: 1024,
        }
    }
}

impl ProviderSettings {
    /// Conventional API key variable for `provider`
    #[must_use]
    pub const fn default_api_key_env(provider: Provider) -> &'static str {
        match provider {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    /// API key variable to read for `provider`
    #[must_use]
    pub fn api_key_env_for(&self, provider: Provider) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| Self::default_api_key_env(provider))
    }
}

/// Provider selection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Seed for reproducible default-provider draws
    pub seed: Option<u64>,
}

/// Observability settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Default log filter
    #[validate(length(min = 1))]
    pub log_level: String,
    /// Emit JSON logs
    pub json_logs: bool,
    /// Serve `/metrics`
    pub metrics_enabled: bool,
    /// Request log sink
    #[validate(nested)]
    pub request_log: RequestLogSettings,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            request_log: RequestLogSettings::default(),
        }
    }
}

/// Where request log records go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// `request_log` tracing target
    #[default]
    Tracing,
    /// JSON Lines file
    File,
    /// Bounded in-memory buffer
    Memory,
}

/// Request log settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_request_log"))]
pub struct RequestLogSettings {
    /// Sink kind
    pub sink: SinkKind,
    /// File path for the `file` sink
    pub path: Option<PathBuf>,
    /// Capacity of the `memory` sink
    #[validate(range(min = 1))]
    pub buffer_size: usize,
}

impl Default for RequestLogSettings {
    fn default() -> Self {
        Self {
            sink: SinkKind::Tracing,
            path: None,
            buffer_size: 1000,
        }
    }
}

fn validate_request_log(settings: &RequestLogSettings) -> Result<(), ValidationError> {
    if settings.sink == SinkKind::File && settings.path.is_none() {
        let mut err = ValidationError::new("missing_path");
        err.message = Some("the file sink requires request_log.path".into());
        return Err(err);
    }
    Ok(())
}
