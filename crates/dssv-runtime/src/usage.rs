//! Oracle usage accounting for one validation run.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::oracle::TokenUsage;

/// Accumulated oracle usage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OracleUsage {
    /// Total tokens used
    pub total_tokens: u32,

    /// Prompt/input tokens
    pub prompt_tokens: u32,

    /// Completion/output tokens
    pub completion_tokens: u32,

    /// Number of oracle calls made
    pub oracle_calls: u32,

    /// Estimated cost in USD
    pub estimated_cost: f64,
}

impl OracleUsage {
    /// Add token usage from one response.
    pub fn add(&mut self, usage: &TokenUsage, model: &str) {
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.total_tokens += usage.total();
        self.oracle_calls += 1;
        self.estimated_cost += Self::estimate_cost(usage, model);
    }

    /// Estimate cost for one usage entry, per million tokens.
    fn estimate_cost(usage: &TokenUsage, model: &str) -> f64 {
        let (input_rate, output_rate) = match model {
            m if m.contains("haiku") => (0.25, 1.25),
            m if m.contains("sonnet") => (3.0, 15.0),
            m if m.contains("opus") => (5.0, 25.0),
            _ => (3.0, 15.0),
        };

        (usage.prompt_tokens as f64 / 1_000_000.0) * input_rate
            + (usage.completion_tokens as f64 / 1_000_000.0) * output_rate
    }
}

/// Thread-safe usage tracker shared across concurrent sentence
/// validations.
#[derive(Debug, Default)]
pub struct UsageTracker {
    usage: RwLock<OracleUsage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record usage after a call.
    pub fn record(&self, usage: &TokenUsage, model: &str) {
        self.usage.write().add(usage, model);
    }

    /// Snapshot the current usage.
    pub fn snapshot(&self) -> OracleUsage {
        self.usage.read().clone()
    }

    /// Reset for a new run.
    pub fn reset(&self) {
        *self.usage.write() = OracleUsage::default();
    }
}
