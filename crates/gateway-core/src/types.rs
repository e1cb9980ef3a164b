//! Closed provider and model enumerations.
//!
//! Both sets are fixed: adding a provider means extending [`Provider`] and the
//! backend dispatch table, adding a model means extending [`Model`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// LLM backend a request is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI chat completions
    OpenAI,
    /// Anthropic messages API
    Anthropic,
    /// Google Gemini generateContent API
    Gemini,
}

impl Provider {
    /// Every provider, in declaration order
    pub const ALL: [Self; 3] = [Self::OpenAI, Self::Anthropic, Self::Gemini];

    /// Wire identifier of the provider
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Model variant requested from a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    /// OpenAI GPT-3.5 Turbo
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    /// OpenAI GPT-4
    #[serde(rename = "gpt-4")]
    Gpt4,
    /// Anthropic Claude 3 Opus
    #[serde(rename = "claude-3-opus-20240229")]
    Claude3Opus,
    /// Google Gemini 1.5 Pro
    #[serde(rename = "gemini-1.5-pro")]
    Gemini15Pro,
}

impl Model {
    /// Every model, in declaration order
    pub const ALL: [Self; 4] = [
        Self::Gpt35Turbo,
        Self::Gpt4,
        Self::Claude3Opus,
        Self::Gemini15Pro,
    ];

    /// Wire identifier of the model
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gpt35Turbo => "gpt-3.5-turbo",
            Self::Gpt4 => "gpt-4",
            Self::Claude3Opus => "claude-3-opus-20240229",
            Self::Gemini15Pro => "gemini-1.5-pro",
        }
    }

    /// Provider this model belongs to.
    ///
    /// Informational only: requests pairing a model with a different
    /// provider are still forwarded unchanged.
    #[must_use]
    pub const fn vendor(self) -> Provider {
        match self {
            Self::Gpt35Turbo | Self::Gpt4 => Provider::OpenAI,
            Self::Claude3Opus => Provider::Anthropic,
            Self::Gemini15Pro => Provider::Gemini,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// A string that names no member of a closed enumeration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_round_trips_through_str() {
        for provider in Provider::ALL {
            assert_eq!(provider.as_str().parse::<Provider>(), Ok(provider));
        }
        assert!("mistral".parse::<Provider>().is_err());
    }

    #[test]
    fn test_provider_serde_matches_wire_ids() {
        let json = serde_json::to_string(&Provider::OpenAI).unwrap();
        assert_eq!(json, "\"openai\"");

        let parsed: Provider = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(parsed, Provider::Gemini);
    }

    #[test]
    fn test_model_serde_matches_wire_ids() {
        for model in Model::ALL {
            let json = serde_json::to_string(&model).unwrap();
            assert_eq!(json, format!("\"{}\"", model.as_str()));
        }
    }

    #[test]
    fn test_model_vendor() {
        assert_eq!(Model::Gpt4.vendor(), Provider::OpenAI);
        assert_eq!(Model::Claude3Opus.vendor(), Provider::Anthropic);
        assert_eq!(Model::Gemini15Pro.vendor(), Provider::Gemini);
    }
}
