//! # Prompt Gateway
//!
//! Stateless HTTP gateway that validates a prompt, picks an LLM backend,
//! forwards the prompt and records one request log entry per invocation.
//!
//! ## Usage
//!
//! ```bash
//! # Start with default configuration
//! prompt-gateway
//!
//! # Start with custom config file
//! prompt-gateway --config /path/to/gateway.yaml
//!
//! # Start with environment overrides
//! GATEWAY_PORT=9000 OPENAI_API_KEY=sk-... prompt-gateway
//! ```

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use gateway_config::{load_config, GatewayConfig, RequestLogSettings, SinkKind};
use gateway_providers::ProviderSet;
use gateway_routing::ProviderSelector;
use gateway_server::{AppState, GatewayHandler, Server, ServerConfig};
use gateway_telemetry::{
    init_logging, JsonLinesSink, LogSink, LoggingConfig, MemorySink, Metrics, TelemetryLogger,
    TracingSink,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::Args;

/// Application entry point
#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    args.apply(&mut config);
    config.check().context("Invalid configuration")?;

    init_logging(
        &LoggingConfig::new()
            .with_level(&config.telemetry.log_level)
            .with_json(config.telemetry.json_logs),
    )
    .context("Failed to initialize logging")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting prompt gateway"
    );

    run(config).await
}

/// Main application logic
async fn run(config: GatewayConfig) -> Result<()> {
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    let providers =
        ProviderSet::from_env(&config.providers).context("Failed to initialize providers")?;
    let configured = providers.configured();
    if configured.is_empty() {
        warn!("No provider API keys configured, every invocation will fail");
    } else {
        info!(providers = ?configured, "Providers initialized");
    }

    let selector = config
        .routing
        .seed
        .map_or_else(ProviderSelector::from_entropy, ProviderSelector::seeded);

    let sink = build_sink(&config.telemetry.request_log)?;
    info!(sink = sink.name(), "Request log sink initialized");

    let mut handler = GatewayHandler::new(Arc::new(providers), selector)
        .with_logger(TelemetryLogger::new(sink));
    if config.telemetry.metrics_enabled {
        handler = handler.with_metrics(Metrics::new().context("Failed to register metrics")?);
    }

    let state = AppState::new(handler).with_body_limit(config.server.body_limit);

    let server_config = ServerConfig::new()
        .with_host(&config.server.host)
        .with_port(config.server.port)
        .with_shutdown_timeout(config.server.shutdown_timeout);

    Server::new(server_config, state)
        .run()
        .await
        .context("Server error")?;

    Ok(())
}

/// Create the request log sink selected by configuration
fn build_sink(settings: &RequestLogSettings) -> Result<Arc<dyn LogSink>> {
    let sink: Arc<dyn LogSink> = match settings.sink {
        SinkKind::Tracing => Arc::new(TracingSink::new()),
        SinkKind::File => {
            let path = settings
                .path
                .clone()
                .context("telemetry.request_log.path is required for the file sink")?;
            Arc::new(JsonLinesSink::new(path))
        }
        SinkKind::Memory => Arc::new(MemorySink::new(settings.buffer_size)),
    };
    Ok(sink)
}
