//! # Gateway Providers
//!
//! LLM backend implementations for the prompt gateway:
//! - OpenAI (GPT-3.5-turbo, GPT-4)
//! - Anthropic (Claude 3)
//! - Google AI (Gemini)
//!
//! [`ProviderSet`] dispatches an invocation to exactly one of them and
//! implements [`gateway_core::LlmInvoker`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod anthropic;
pub mod backend;
pub mod dispatch;
pub mod google;
pub mod openai;

pub use anthropic::AnthropicBackend;
pub use backend::{BackendConfig, CompletionBackend};
pub use dispatch::ProviderSet;
pub use google::GeminiBackend;
pub use openai::OpenAIBackend;
