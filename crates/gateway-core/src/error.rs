//! Error types for the gateway.

use crate::types::Provider;
use crate::validation::FlattenedErrors;

/// Result alias used across the gateway crates
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Fallback message for errors that carry no message of their own
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown Error";

/// Gateway error type
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Payload failed the request schema
    #[error("Invalid Request Body")]
    Validation(FlattenedErrors),

    /// Prompt empty after validation
    #[error("No prompt provided in the request body")]
    MissingPrompt,

    /// Body was not UTF-8 encoded JSON
    #[error("{0}")]
    MalformedBody(String),

    /// The chosen backend failed
    #[error("{message}")]
    Backend {
        /// Backend that failed
        provider: Provider,
        /// Vendor or transport message
        message: String,
        /// Upstream HTTP status, when one was received
        status: Option<u16>,
    },

    /// Backend selected but not configured
    #[error("{provider} provider is not configured")]
    ProviderNotConfigured {
        /// Provider that was requested
        provider: Provider,
    },

    /// Invalid gateway configuration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Internal error
    #[error("{0}")]
    Internal(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedBody(err.to_string())
    }
}

impl GatewayError {
    /// Create a backend error
    pub fn backend(provider: Provider, message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Backend {
            provider,
            message: message.into(),
            status,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status code reported to the caller
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::MissingPrompt => 400,
            Self::MalformedBody(_)
            | Self::Backend { .. }
            | Self::ProviderNotConfigured { .. }
            | Self::Configuration { .. }
            | Self::Internal(_) => 500,
        }
    }

    /// Whether the caller is at fault
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Message recorded in telemetry and returned on 500 responses.
    ///
    /// Falls back to [`UNKNOWN_ERROR_MESSAGE`] when the error renders empty.
    #[must_use]
    pub fn message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Provider involved in the failure, if any
    #[must_use]
    pub fn provider(&self) -> Option<Provider> {
        match self {
            Self::Backend { provider, .. } | Self::ProviderNotConfigured { provider } => {
                Some(*provider)
            }
            _ => None,
        }
    }
}
