//! Token pricing and cost estimation.
//!
//! Prices are expressed in USD per 1000 tokens, separately for input and
//! output. Models missing from the table cost nothing: the estimate is a
//! known lower bound for unlisted providers and models, not an error.

use crate::communication::LlmProvider;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Price of one model per 1000 tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrice {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl ModelPrice {
    pub const fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input_cost = (input_tokens as f64 / 1000.0) * self.input_per_1k;
        let output_cost = (output_tokens as f64 / 1000.0) * self.output_per_1k;
        input_cost + output_cost
    }
}

/// Per-provider, per-model price lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingTable {
    prices: HashMap<LlmProvider, HashMap<String, ModelPrice>>,
}

impl PricingTable {
    /// An empty table; every lookup costs zero.
    pub fn empty() -> Self {
        Self {
            prices: HashMap::new(),
        }
    }

    /// Adds or replaces the price of a model.
    pub fn with_price(
        mut self,
        provider: LlmProvider,
        model: impl Into<String>,
        price: ModelPrice,
    ) -> Self {
        self.set_price(provider, model, price);
        self
    }

    pub fn set_price(
        &mut self,
        provider: LlmProvider,
        model: impl Into<String>,
        price: ModelPrice,
    ) {
        self.prices
            .entry(provider)
            .or_default()
            .insert(model.into(), price);
    }

    pub fn price_for(&self, provider: LlmProvider, model: &str) -> Option<ModelPrice> {
        self.prices.get(&provider)?.get(model).copied()
    }

    /// Estimated cost of a call. Unknown providers and models cost `0.0`.
    pub fn calculate_cost(
        &self,
        provider: LlmProvider,
        model: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> f64 {
        self.price_for(provider, model)
            .map(|price| price.cost(input_tokens, output_tokens))
            .unwrap_or(0.0)
    }
}

impl Default for PricingTable {
    /// Built-in OpenAI list prices.
    fn default() -> Self {
        Self::empty()
            .with_price(LlmProvider::OpenAi, "gpt-4", ModelPrice::new(0.03, 0.06))
            .with_price(LlmProvider::OpenAi, "gpt-4-turbo", ModelPrice::new(0.01, 0.03))
            .with_price(LlmProvider::OpenAi, "gpt-3.5-turbo", ModelPrice::new(0.0015, 0.002))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_gpt4_cost() {
        let table = PricingTable::default();
        let cost = table.calculate_cost(LlmProvider::OpenAi, "gpt-4", 1000, 1000);
        assert!(approx(cost, 0.09), "got {cost}");
    }

    #[test]
    fn test_fractional_thousands() {
        let table = PricingTable::default();
        let cost = table.calculate_cost(LlmProvider::OpenAi, "gpt-4", 50, 30);
        assert!(approx(cost, 0.0033), "got {cost}");
    }

    #[test]
    fn test_unknown_model_and_provider_cost_nothing() {
        let table = PricingTable::default();
        assert_eq!(table.calculate_cost(LlmProvider::OpenAi, "made-up-model", 5000, 5000), 0.0);
        assert_eq!(table.calculate_cost(LlmProvider::Anthropic, "gpt-4", 5000, 5000), 0.0);
    }

    #[test]
    fn test_override_replaces_builtin() {
        let table = PricingTable::default().with_price(
            LlmProvider::OpenAi,
            "gpt-4",
            ModelPrice::new(0.01, 0.01),
        );
        let cost = table.calculate_cost(LlmProvider::OpenAi, "gpt-4", 1000, 1000);
        assert!(approx(cost, 0.02));
    }
}
