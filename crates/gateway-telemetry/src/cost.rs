//! Cost estimation from token usage.

use gateway_core::{Model, Usage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Model pricing information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Model ID
    pub model: String,
    /// Cost per 1K input tokens (USD)
    pub input_cost_per_1k: f64,
    /// Cost per 1K output tokens (USD)
    pub output_cost_per_1k: f64,
}

impl ModelPricing {
    /// Create new model pricing
    #[must_use]
    pub fn new(model: impl Into<String>, input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            model: model.into(),
            input_cost_per_1k: input_per_1k,
            output_cost_per_1k: output_per_1k,
        }
    }

    /// Calculate cost for given token counts
    #[must_use]
    pub fn calculate_cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        let input_cost = (f64::from(input_tokens) / 1000.0) * self.input_cost_per_1k;
        let output_cost = (f64::from(output_tokens) / 1000.0) * self.output_cost_per_1k;
        input_cost + output_cost
    }
}

/// Pricing lookup keyed by model ID
#[derive(Debug, Clone)]
pub struct PricingTable {
    prices: HashMap<String, ModelPricing>,
    fallback: ModelPricing,
}

impl Default for PricingTable {
    fn default() -> Self {
        let prices = [
            ModelPricing::new(Model::Gpt35Turbo.as_str(), 0.0005, 0.0015),
            ModelPricing::new(Model::Gpt4.as_str(), 0.03, 0.06),
            ModelPricing::new(Model::Claude3Opus.as_str(), 0.015, 0.075),
            ModelPricing::new(Model::Gemini15Pro.as_str(), 0.00125, 0.005),
        ];

        Self {
            prices: prices.into_iter().map(|p| (p.model.clone(), p)).collect(),
            fallback: ModelPricing::new("default", 0.01, 0.03),
        }
    }
}

impl PricingTable {
    /// Create the built-in pricing table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace pricing for a model
    #[must_use]
    pub fn with_pricing(mut self, pricing: ModelPricing) -> Self {
        self.prices.insert(pricing.model.clone(), pricing);
        self
    }

    /// Pricing for `model`, or the fallback rate.
    ///
    /// Backends often report dated model names (`gpt-4-0613`), so an exact
    /// miss retries with the longest known model ID that prefixes `model`.
    #[must_use]
    pub fn get(&self, model: &str) -> &ModelPricing {
        self.prices.get(model).unwrap_or_else(|| {
            self.prices
                .values()
                .filter(|p| model.starts_with(p.model.as_str()))
                .max_by_key(|p| p.model.len())
                .unwrap_or(&self.fallback)
        })
    }

    /// Estimated USD cost of `usage` on `model`
    #[must_use]
    pub fn estimate(&self, model: &str, usage: &Usage) -> f64 {
        self.get(model)
            .calculate_cost(usage.prompt_tokens, usage.completion_tokens)
    }
}
