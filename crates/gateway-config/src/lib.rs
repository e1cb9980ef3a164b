//! # Gateway Config
//!
//! Typed, validated configuration for the prompt gateway, loaded from YAML,
//! TOML or JSON files with `GATEWAY_*` environment overrides.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod loader;

pub use config::{
    GatewayConfig, ProviderSettings, ProvidersConfig, RequestLogSettings, RoutingSettings,
    ServerSettings, SinkKind, TelemetrySettings,
};
pub use error::ConfigError;
pub use loader::{apply_env_overrides, load_config, ConfigLoader};
