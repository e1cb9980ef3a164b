//! Request types for the gateway.
//!
//! [`IncomingRequest`] is only ever produced by the
//! [`RequestValidator`](crate::validation::RequestValidator); it is built once per
//! invocation and never mutated afterwards.

use crate::types::{Model, Provider};
use serde::{Deserialize, Serialize};

/// Validated inbound prompt request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingRequest {
    /// Prompt text, at least one character
    pub prompt: String,

    /// Opaque conversation identifier (carried, not used)
    #[serde(rename = "threadID", default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    /// Explicitly requested provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,

    /// Explicitly requested model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,
}

impl IncomingRequest {
    /// Whether the requested model belongs to a different vendor than the
    /// requested provider. Such pairs are forwarded unchanged.
    #[must_use]
    pub fn has_mismatched_model(&self) -> bool {
        matches!((self.provider, self.model), (Some(p), Some(m)) if m.vendor() != p)
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction
    System,
    /// End-user turn
    User,
    /// Model turn
    Assistant,
}

impl MessageRole {
    /// Wire name of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single conversation message passed to a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Prior messages followed by the prompt as the final user turn
    #[must_use]
    pub fn conversation(history: &[Self], prompt: &str) -> Vec<Self> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.extend_from_slice(history);
        messages.push(Self::user(prompt));
        messages
    }
}
