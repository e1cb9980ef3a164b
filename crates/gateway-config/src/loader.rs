//! Configuration loading.
//!
//! Precedence, lowest to highest: built-in defaults, the config file,
//! `GATEWAY_*` environment variables.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{GatewayConfig, SinkKind};
use crate::error::ConfigError;

/// Overrides `server.host`
pub const ENV_HOST: &str = "GATEWAY_HOST";
/// Overrides `server.port`
pub const ENV_PORT: &str = "GATEWAY_PORT";
/// Overrides `telemetry.log_level`
pub const ENV_LOG_LEVEL: &str = "GATEWAY_LOG_LEVEL";
/// Sets `telemetry.request_log.path` and switches the sink to `file`
pub const ENV_REQUEST_LOG_PATH: &str = "GATEWAY_REQUEST_LOG_PATH";
/// Overrides `routing.seed`
pub const ENV_ROUTING_SEED: &str = "GATEWAY_ROUTING_SEED";

/// Builder for a validated [`GatewayConfig`]
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    use_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader using defaults and the process environment
    #[must_use]
    pub const fn new() -> Self {
        Self {
            file: None,
            use_env: true,
        }
    }

    /// Read settings from `path`
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Ignore `GATEWAY_*` environment variables
    #[must_use]
    pub const fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Load, override and validate the configuration
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed, an environment
    /// override is malformed, or the result fails validation
    pub async fn load(self) -> Result<GatewayConfig, ConfigError> {
        let mut config = match &self.file {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration file");
                let content = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| ConfigError::Read {
                        path: path.clone(),
                        source,
                    })?;
                parse(path, &content)?
            }
            None => GatewayConfig::default(),
        };

        if self.use_env {
            apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
        }

        config.check()?;
        Ok(config)
    }
}

/// Load configuration from an optional file plus the environment
///
/// # Errors
/// See [`ConfigLoader::load`]
pub async fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let loader = ConfigLoader::new();
    match path {
        Some(path) => loader.with_file(path).load().await,
        None => loader.load().await,
    }
}

/// Parse `content` according to the extension of `path`
///
/// # Errors
/// Returns error on an unknown extension or malformed content
pub fn parse(path: &Path, content: &str) -> Result<GatewayConfig, ConfigError> {
    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("yaml" | "yml") => serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string())),
        Some("toml") => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
        Some("json") => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Apply `GATEWAY_*` overrides read through `lookup`
///
/// # Errors
/// Returns error if a numeric override does not parse
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_HOST) {
        debug!(var = ENV_HOST, "Applying environment override");
        config.server.host = host;
    }

    if let Some(port) = lookup(ENV_PORT) {
        debug!(var = ENV_PORT, "Applying environment override");
        config.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            var: ENV_PORT,
            value: port.clone(),
        })?;
    }

    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        debug!(var = ENV_LOG_LEVEL, "Applying environment override");
        config.telemetry.log_level = level;
    }

    if let Some(path) = lookup(ENV_REQUEST_LOG_PATH) {
        debug!(var = ENV_REQUEST_LOG_PATH, "Applying environment override");
        config.telemetry.request_log.sink = SinkKind::File;
        config.telemetry.request_log.path = Some(PathBuf::from(path));
    }

    if let Some(seed) = lookup(ENV_ROUTING_SEED) {
        debug!(var = ENV_ROUTING_SEED, "Applying environment override");
        let parsed = seed.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            var: ENV_ROUTING_SEED,
            value: seed.clone(),
        })?;
        config.routing.seed = Some(parsed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r"
server:
  port: 9090
  shutdown_timeout: 5s
providers:
  anthropic:
    max_tokens: 2048
    base_url: http://localhost:4000
  gemini:
    enabled: false
routing:
  seed: 7
";
        let config = parse(Path::new("gateway.yaml"), yaml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.providers.anthropic.max_tokens, 2048);
        assert_eq!(
            config.providers.anthropic.base_url.as_deref(),
            Some("http://localhost:4000")
        );
        assert!(!config.providers.gemini.enabled);
        assert!(config.providers.openai.enabled);
        assert_eq!(config.routing.seed, Some(7));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[server]
host = "127.0.0.1"

[providers.openai]
default_model = "gpt-4"
timeout = "30s"

[telemetry.request_log]
sink = "memory"
buffer_size = 50
"#;
        let config = parse(Path::new("gateway.toml"), toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.providers.openai.default_model.as_deref(), Some("gpt-4"));
        assert_eq!(config.providers.openai.timeout, Duration::from_secs(30));
        assert_eq!(config.telemetry.request_log.sink, SinkKind::Memory);
        assert_eq!(config.telemetry.request_log.buffer_size, 50);
    }

    #[test]
    fn test_parse_unknown_extension() {
        let result = parse(Path::new("gateway.ini"), "");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_parse_malformed_yaml() {
        let result = parse(Path::new("gateway.yml"), "server: [unclosed");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                (ENV_HOST, "127.0.0.1"),
                (ENV_PORT, "3000"),
                (ENV_LOG_LEVEL, "debug"),
                (ENV_REQUEST_LOG_PATH, "/var/log/gateway.jsonl"),
                (ENV_ROUTING_SEED, "42"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(config.telemetry.request_log.sink, SinkKind::File);
        assert_eq!(
            config.telemetry.request_log.path,
            Some(PathBuf::from("/var/log/gateway.jsonl"))
        );
        assert_eq!(config.routing.seed, Some(42));
    }

    #[test]
    fn test_env_invalid_port() {
        let mut config = GatewayConfig::default();
        let result = apply_env_overrides(&mut config, env(&[(ENV_PORT, "eighty")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv { var: ENV_PORT, .. })
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.yaml");
        tokio::fs::write(&path, "server:\n  port: 8181\n").await.unwrap();

        let config = ConfigLoader::new()
            .with_file(&path)
            .without_env()
            .load()
            .await
            .unwrap();
        assert_eq!(config.server.port, 8181);
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.yaml");
        tokio::fs::write(&path, "telemetry:\n  request_log:\n    sink: file\n")
            .await
            .unwrap();

        let result = ConfigLoader::new()
            .with_file(&path)
            .without_env()
            .load()
            .await;
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = ConfigLoader::new()
            .with_file("/nonexistent/gateway.yaml")
            .without_env()
            .load()
            .await;
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
