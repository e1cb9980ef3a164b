//! The backend invocation seam.

use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::request::ChatMessage;
use crate::response::ProviderResponse;
use crate::types::{Model, Provider};

/// Capability to invoke an LLM backend.
///
/// One call is one network round trip: implementations do not retry, cache or
/// stream. When `model` is `None` the backend picks its own default.
#[async_trait]
pub trait LlmInvoker: Send + Sync {
    /// Send `prompt` (after `history`) to `provider` and return its response
    async fn invoke(
        &self,
        history: &[ChatMessage],
        prompt: &str,
        provider: Provider,
        model: Option<Model>,
    ) -> GatewayResult<ProviderResponse>;
}
