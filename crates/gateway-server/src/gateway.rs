//! The invocation pipeline.
//!
//! validate → select provider → invoke backend → log → respond. Every exit
//! path writes exactly one request log record and produces exactly one
//! [`InvocationResponse`].

use gateway_core::{
    GatewayError, GatewayResult, IncomingRequest, InvocationEvent, InvocationResponse,
    LlmInvoker, Provider, ProviderResponse, RequestValidator,
};
use gateway_routing::ProviderSelector;
use gateway_telemetry::{LogRecord, Metrics, PricingTable, TelemetryLogger};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};

/// Error field of a 400 validation response
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body.";

/// Message field of a 400 missing-prompt response
pub const MISSING_PROMPT_MESSAGE: &str = "No prompt provided in the request body.";

#[derive(Serialize)]
struct SuccessBody<'a> {
    provider: Provider,
    response: &'a ProviderResponse,
}

/// Handles one invocation end to end
pub struct GatewayHandler {
    validator: RequestValidator,
    selector: ProviderSelector,
    invoker: Arc<dyn LlmInvoker>,
    logger: TelemetryLogger,
    metrics: Option<Metrics>,
    pricing: PricingTable,
}

impl GatewayHandler {
    /// Create a handler logging to the `request_log` tracing target
    pub fn new(invoker: Arc<dyn LlmInvoker>, selector: ProviderSelector) -> Self {
        Self {
            validator: RequestValidator::new(),
            selector,
            invoker,
            logger: TelemetryLogger::tracing(),
            metrics: None,
            pricing: PricingTable::default(),
        }
    }

    /// Use `logger` for request log records
    #[must_use]
    pub fn with_logger(mut self, logger: TelemetryLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Count invocations in `metrics`
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Estimate cost with `pricing`
    #[must_use]
    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    /// Metrics registry, when enabled
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Handle one invocation. Never fails: errors become 400/500 responses.
    pub async fn handle(&self, event: &InvocationEvent) -> InvocationResponse {
        let request_id = event
            .request_id()
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);
        let span = info_span!("invocation", request_id = %request_id);

        self.run(event, request_id).instrument(span).await
    }

    async fn run(&self, event: &InvocationEvent, request_id: String) -> InvocationResponse {
        let started = Instant::now();
        let mut record = LogRecord::start(request_id, event.to_raw());

        let outcome = self.process(event, &mut record).await;
        self.respond(record, outcome, started).await
    }

    /// Write the single log record for `outcome` and build the reply
    async fn respond(
        &self,
        mut record: LogRecord,
        outcome: GatewayResult<(Provider, ProviderResponse)>,
        started: Instant,
    ) -> InvocationResponse {
        let outcome = outcome.and_then(|(provider, response)| {
            let body = serde_json::to_string(&SuccessBody {
                provider,
                response: &response,
            })
            .map_err(|e| GatewayError::internal(format!("Failed to encode response: {e}")))?;
            Ok((response, body))
        });
        let provider = record.provider;

        let (reply, tokens) = match outcome {
            Ok((response, body)) => {
                let tokens = response.total_tokens();
                record.model = Some(response.model.clone());
                record.tokens_used = tokens;
                record.cost = response
                    .usage
                    .as_ref()
                    .map_or(0.0, |usage| self.pricing.estimate(&response.model, usage));

                info!(
                    provider = ?provider,
                    model = %response.model,
                    tokens,
                    "Invocation succeeded"
                );

                let raw = serde_json::to_string(&response).unwrap_or_default();
                self.logger.record_success(record.with_response(raw, 200)).await;
                (
                    InvocationResponse {
                        status_code: 200,
                        body,
                    },
                    tokens,
                )
            }
            Err(err) => {
                let status = err.status_code();
                let message = err.message();
                if err.is_client_error() {
                    info!(status, error = %message, "Invocation rejected");
                } else {
                    error!(provider = ?provider, status, error = %message, "Invocation failed");
                }

                self.logger
                    .record_failure(record.with_error(message, status))
                    .await;
                (Self::error_response(&err), 0)
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_request(provider, reply.status_code, started.elapsed(), tokens);
        }
        reply
    }

    async fn process(
        &self,
        event: &InvocationEvent,
        record: &mut LogRecord,
    ) -> GatewayResult<(Provider, ProviderResponse)> {
        let payload = event.decode_body()?;
        let request = self
            .validator
            .validate(payload.as_ref())
            .map_err(GatewayError::Validation)?;

        Self::require_prompt(&request)?;

        if request.has_mismatched_model() {
            debug!(
                provider = ?request.provider,
                model = ?request.model,
                "Model does not belong to the requested provider, forwarding unchanged"
            );
        }

        let provider = self.selector.select(request.provider);
        record.provider = Some(provider);
        record.model = request.model.map(|m| m.as_str().to_string());

        debug!(provider = %provider, model = ?request.model, "Invoking provider");
        let response = self
            .invoker
            .invoke(&[], &request.prompt, provider, request.model)
            .await?;

        Ok((provider, response))
    }

    /// Guard on the validator's non-empty prompt guarantee
    fn require_prompt(request: &IncomingRequest) -> GatewayResult<()> {
        if request.prompt.is_empty() {
            return Err(GatewayError::MissingPrompt);
        }
        Ok(())
    }

    fn error_response(err: &GatewayError) -> InvocationResponse {
        match err {
            GatewayError::Validation(details) => InvocationResponse::json(
                400,
                &json!({
                    "error": INVALID_BODY_MESSAGE,
                    "details": serde_json::to_value(details).unwrap_or_default(),
                }),
            ),
            GatewayError::MissingPrompt => {
                InvocationResponse::json(400, &json!({ "message": MISSING_PROMPT_MESSAGE }))
            }
            other => InvocationResponse::json(
                other.status_code(),
                &json!({ "error": other.message() }),
            ),
        }
    }
}

impl std::fmt::Debug for GatewayHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayHandler")
            .field("selector", &self.selector)
            .field("logger", &self.logger)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}
