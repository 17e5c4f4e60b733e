//! Corrected-summary generation.
//!
//! Takes the original summary, the numeric corrections produced by the
//! external comparison collaborator, and the high-severity subset of
//! validation issues, and asks the oracle for one corrected full-summary
//! text. Any failure — transport, decode, missing key — returns the
//! original summary unchanged.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use dssv_core::decode::strip_code_fence;
use dssv_core::{Severity, ValidationOutcome};

use crate::config::RuntimeConfig;
use crate::oracle::{ChatMessage, LlmOracle};
use crate::prompts;
use crate::usage::UsageTracker;

/// At most this many numeric corrections go into the prompt.
const MAX_CORRECTIONS: usize = 10;
/// At most this many high-severity issues go into the prompt.
const MAX_ISSUES: usize = 5;

/// One numeric discrepancy between summary and source. Produced by the
/// external metric-comparison collaborator; consumed here as input only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericCorrection {
    pub metric: String,
    pub period: String,
    pub summary_value: f64,
    pub source_value: f64,
    pub unit: String,
    pub difference_pct: f64,
}

#[derive(Debug, Deserialize)]
struct CorrectedEnvelope {
    corrected_dss: String,
}

/// Generates the corrected summary text.
pub struct CorrectionGenerator {
    oracle: Arc<dyn LlmOracle>,
    config: RuntimeConfig,
    usage: Arc<UsageTracker>,
}

impl CorrectionGenerator {
    pub fn new(oracle: Arc<dyn LlmOracle>, config: RuntimeConfig, usage: Arc<UsageTracker>) -> Self {
        Self {
            oracle,
            config,
            usage,
        }
    }

    /// Produce a corrected version of the summary. Fail-soft: the
    /// original text comes back unchanged when the oracle cannot help.
    pub async fn generate(
        &self,
        original_summary: &str,
        source_text: &str,
        corrections: &[NumericCorrection],
        issues: &[ValidationOutcome],
    ) -> String {
        let major_issues: Vec<ValidationOutcome> = issues
            .iter()
            .filter(|o| {
                o.is_issue() && matches!(o.severity, Severity::Critical | Severity::High)
            })
            .take(MAX_ISSUES)
            .cloned()
            .collect();
        let corrections = &corrections[..corrections.len().min(MAX_CORRECTIONS)];

        let prompt = prompts::corrected_summary_prompt(
            original_summary,
            source_text,
            corrections,
            &major_issues,
            self.config.summary_char_budget,
        );

        let response = match self
            .oracle
            .complete(vec![ChatMessage::user(prompt)], &self.config.completion_config())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "corrected summary generation failed");
                return original_summary.to_string();
            }
        };

        self.usage.record(&response.usage, &response.model);

        let body = strip_code_fence(&response.content);
        match serde_json::from_str::<CorrectedEnvelope>(&body) {
            Ok(envelope) => envelope.corrected_dss,
            Err(e) => {
                tracing::warn!(error = %e, "corrected summary response undecodable; keeping original");
                original_summary.to_string()
            }
        }
    }
}
