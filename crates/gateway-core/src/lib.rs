//! # Gateway Core
//!
//! Core types, validation and error handling for the prompt gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - The closed [`Provider`] and [`Model`] enumerations
//! - The validated [`IncomingRequest`] and the normalized [`ProviderResponse`]
//! - The invocation envelope ([`InvocationEvent`] / [`InvocationResponse`])
//! - The request validator with flattened, field-indexed error reports
//! - The [`LlmInvoker`] seam through which backends are called
//! - Error types and handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod invocation;
pub mod provider;
pub mod request;
pub mod response;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use error::{GatewayError, GatewayResult};
pub use invocation::{InvocationEvent, InvocationResponse};
pub use provider::LlmInvoker;
pub use request::{ChatMessage, IncomingRequest, MessageRole};
pub use response::{ProviderResponse, Usage};
pub use types::{Model, Provider};
pub use validation::{FlattenedErrors, RequestValidator};
