//! Prometheus metrics.

use gateway_core::Provider;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

const NAMESPACE: &str = "gateway";
const LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0];

/// Gateway metrics registry
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    tokens_total: IntCounterVec,
}

impl Metrics {
    /// Create and register all gateway metrics
    ///
    /// # Errors
    /// Returns error if a metric cannot be registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("requests_total", "Invocations by resolved provider and status code")
                .namespace(NAMESPACE),
            &["provider", "status"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "request_duration_seconds",
                "End-to-end invocation latency",
            )
            .namespace(NAMESPACE)
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["provider"],
        )?;
        let tokens_total = IntCounterVec::new(
            Opts::new("tokens_total", "Tokens reported by backends").namespace(NAMESPACE),
            &["provider"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(tokens_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            tokens_total,
        })
    }

    /// Record one finished invocation
    pub fn record_request(
        &self,
        provider: Option<Provider>,
        status: u16,
        latency: Duration,
        tokens: u32,
    ) {
        let provider = provider.map_or("none", Provider::as_str);
        let status = status.to_string();

        self.requests_total
            .with_label_values(&[provider, status.as_str()])
            .inc();
        self.request_duration
            .with_label_values(&[provider])
            .observe(latency.as_secs_f64());
        if tokens > 0 {
            self.tokens_total
                .with_label_values(&[provider])
                .inc_by(u64::from(tokens));
        }
    }

    /// Requests counted for `provider` and `status`
    #[must_use]
    pub fn request_count(&self, provider: Option<Provider>, status: u16) -> u64 {
        let provider = provider.map_or("none", Provider::as_str);
        self.requests_total
            .with_label_values(&[provider, status.to_string().as_str()])
            .get()
    }

    /// Render all metrics in the Prometheus text format
    #[must_use]
    pub fn gather(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

/// Metrics registration error
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Prometheus rejected a metric
    #[error("Failed to register metric: {0}")]
    Prometheus(#[from] prometheus::Error),
}
