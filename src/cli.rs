//! CLI argument definitions using clap.

use clap::Parser;
use gateway_config::GatewayConfig;
use std::path::PathBuf;

/// Prompt Gateway - one endpoint in front of OpenAI, Anthropic and Gemini
#[derive(Parser, Debug)]
#[command(name = "prompt-gateway")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file (.yaml, .yml, .toml or .json)
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long, env = "GATEWAY_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "GATEWAY_PORT")]
    pub port: Option<u16>,

    /// Log filter (overridden by RUST_LOG)
    #[arg(long, env = "GATEWAY_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long, env = "GATEWAY_JSON_LOGS")]
    pub json_logs: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut GatewayConfig) {
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = &self.log_level {
            config.telemetry.log_level.clone_from(level);
        }
        if self.json_logs {
            config.telemetry.json_logs = true;
        }
    }
}
