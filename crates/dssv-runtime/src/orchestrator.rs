//! Pipeline orchestration: classify → segment → validate → aggregate.
//!
//! Sentence validations fan out through a bounded worker pool and fan
//! back in through an order-preserving collector: every outcome arrives
//! exactly once regardless of completion order, and outcomes are
//! re-sorted into (section, sentence index) order before aggregation.
//! Per-sentence failures never cross the orchestrator boundary; the only
//! document-level failure is the oracle being unreachable before any
//! work starts.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;

use dssv_core::{
    aggregate, classify, split_sentences, AggregateAssessment, SectionKind, SentenceUnit,
    ValidationOutcome,
};

use crate::config::RuntimeConfig;
use crate::oracle::{ChatMessage, LlmOracle};
use crate::prompts;
use crate::usage::{OracleUsage, UsageTracker};
use crate::validator::SentenceValidator;

/// Company placeholder when extraction fails.
const COMPANY_UNKNOWN: &str = "미상";

/// Document-level pipeline errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Oracle collaborator unreachable: {0}")]
    OracleUnavailable(String),
}

/// Drives one full validation run. Owns the lifetime of all entities for
/// that run; nothing is shared or cached across runs.
pub struct ValidationOrchestrator {
    oracle: Arc<dyn LlmOracle>,
    config: RuntimeConfig,
    usage: Arc<UsageTracker>,
    validator: SentenceValidator,
}

impl ValidationOrchestrator {
    pub fn new(oracle: Arc<dyn LlmOracle>, config: RuntimeConfig) -> Self {
        let usage = Arc::new(UsageTracker::new());
        let validator = SentenceValidator::new(oracle.clone(), config.clone(), usage.clone());
        Self {
            oracle,
            config,
            usage,
            validator,
        }
    }

    /// Pipeline entry point.
    ///
    /// Validates every sentence of every sufficiently long section of the
    /// summary against the source and aggregates the outcomes.
    pub async fn validate(
        &self,
        source_text: &str,
        summary_text: &str,
        external_reference: Option<&str>,
    ) -> Result<AggregateAssessment, PipelineError> {
        if !self.oracle.health_check().await {
            return Err(PipelineError::OracleUnavailable(
                self.oracle.name().to_string(),
            ));
        }

        let sections = classify(summary_text);
        if sections.is_empty() {
            tracing::warn!("summary has no classifiable content");
            return Ok(aggregate(Vec::new()));
        }

        let company = self.extract_company(summary_text).await;
        tracing::debug!(company = %company, sections = sections.len(), "starting validation run");

        let mut tasks: Vec<(SectionKind, SentenceUnit)> = Vec::new();
        for section in &sections {
            if section.text.chars().count() <= self.config.min_section_chars {
                tracing::debug!(section = %section.kind, "section below minimum length; skipped");
                continue;
            }
            let units = split_sentences(&section.text);
            tracing::debug!(section = %section.kind, sentences = units.len(), "section segmented");
            tasks.extend(units.into_iter().map(|unit| (section.kind, unit)));
        }

        let mut outcomes: Vec<ValidationOutcome> = stream::iter(tasks)
            .map(|(kind, unit)| {
                let validator = &self.validator;
                async move {
                    validator
                        .validate(source_text, kind, &unit, external_reference)
                        .await
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        for outcome in &mut outcomes {
            if outcome.company.is_empty() {
                outcome.company = company.clone();
            }
        }

        // aggregate() re-sorts into (section, index) order.
        Ok(aggregate(outcomes))
    }

    /// Extract the company name from the summary head. Fail-soft: any
    /// oracle failure or empty answer yields the unknown placeholder.
    async fn extract_company(&self, summary_text: &str) -> String {
        let prompt = prompts::company_extraction_prompt(summary_text);
        let mut completion = self.config.completion_config();
        completion.max_tokens = 100;

        match self
            .oracle
            .complete(vec![ChatMessage::user(prompt)], &completion)
            .await
        {
            Ok(response) => {
                self.usage.record(&response.usage, &response.model);
                let name = response.content.trim().to_string();
                if name.is_empty() {
                    COMPANY_UNKNOWN.to_string()
                } else {
                    name
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "company extraction failed");
                COMPANY_UNKNOWN.to_string()
            }
        }
    }

    /// Oracle usage accumulated so far in this run.
    pub fn usage(&self) -> OracleUsage {
        self.usage.snapshot()
    }
}
