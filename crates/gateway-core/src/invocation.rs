//! Invocation envelope.
//!
//! An [`InvocationEvent`] carries the raw request body either as JSON text or as
//! an already-structured value. An [`InvocationResponse`] carries a status code
//! and a JSON-encoded body.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{GatewayError, GatewayResult};

/// Header used to correlate an invocation with its log record
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Inbound invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationEvent {
    /// Request body, JSON text or structured value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Request headers, lower-cased names
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Set when the raw body was not valid UTF-8
    #[serde(skip)]
    encoding_error: Option<String>,
}

impl InvocationEvent {
    /// Event with a JSON text body
    #[must_use]
    pub fn from_text(body: impl Into<String>) -> Self {
        Self {
            body: Some(Value::String(body.into())),
            ..Self::default()
        }
    }

    /// Event with an already-structured body
    #[must_use]
    pub fn from_value(body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }

    /// Event built from a raw HTTP body. An empty body means no body at all.
    ///
    /// Invalid UTF-8 is kept (lossily) for telemetry and rejected by
    /// [`decode_body`](Self::decode_body).
    #[must_use]
    pub fn from_http_body(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::default();
        }
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::from_text(text),
            Err(err) => Self {
                encoding_error: Some(format!("Request body is not valid UTF-8: {err}")),
                ..Self::from_text(String::from_utf8_lossy(bytes).into_owned())
            },
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Caller-supplied request ID, if any
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get(REQUEST_ID_HEADER)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Decode the body.
    ///
    /// Text bodies are parsed as JSON; a parse failure or a body that was not
    /// UTF-8 is an error. Structured bodies are returned as-is and an absent
    /// body yields `None`.
    pub fn decode_body(&self) -> GatewayResult<Option<Value>> {
        if let Some(message) = &self.encoding_error {
            return Err(GatewayError::MalformedBody(message.clone()));
        }
        match &self.body {
            Some(Value::String(text)) => Ok(Some(serde_json::from_str(text)?)),
            Some(value) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    /// Serialized form of the whole event, as recorded in telemetry
    #[must_use]
    pub fn to_raw(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Outbound invocation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    /// HTTP status code
    pub status_code: u16,
    /// JSON-encoded body
    pub body: String,
}

impl InvocationResponse {
    /// Response with a JSON body
    #[must_use]
    pub fn json(status_code: u16, body: &Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    /// Parse the body back into JSON
    pub fn body_json(&self) -> GatewayResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
