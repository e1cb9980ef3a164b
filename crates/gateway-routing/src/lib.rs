//! # Gateway Routing
//!
//! Provider selection for the prompt gateway.
//!
//! An explicitly requested provider is always honoured. Requests without one are
//! routed by a fair coin flip between OpenAI and Anthropic, drawn from an
//! injected random source so that tests can make it deterministic.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod selector;

// Re-export main types
pub use selector::{ProviderSelector, DEFAULT_CANDIDATES};
