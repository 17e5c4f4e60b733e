//! Per-sentence validation: one oracle call, decode, filter, outcome.
//!
//! This is the unit of work the orchestrator fans out. It never fails:
//! transport errors and timeouts collapse to an ERROR outcome, malformed
//! responses decode to a no-issue fallback, and no retry is performed at
//! this layer.

use std::sync::Arc;

use dssv_core::{
    decode_oracle_response, filter_issues, IssueType, RawIssue, SectionKind, SentenceUnit,
    Severity, ValidationOutcome, ValidationStatus,
};

use crate::config::RuntimeConfig;
use crate::oracle::{ChatMessage, LlmOracle};
use crate::prompts;
use crate::usage::UsageTracker;

/// Validates one sentence at a time against the immutable source text.
///
/// Invocations are independent: they read only their inputs and write
/// only their own outcome, so any number may run concurrently.
pub struct SentenceValidator {
    oracle: Arc<dyn LlmOracle>,
    config: RuntimeConfig,
    usage: Arc<UsageTracker>,
}

impl SentenceValidator {
    pub fn new(oracle: Arc<dyn LlmOracle>, config: RuntimeConfig, usage: Arc<UsageTracker>) -> Self {
        Self {
            oracle,
            config,
            usage,
        }
    }

    /// Validate one sentence. Always returns exactly one outcome.
    pub async fn validate(
        &self,
        source_text: &str,
        section: SectionKind,
        unit: &SentenceUnit,
        external_reference: Option<&str>,
    ) -> ValidationOutcome {
        let prompt = prompts::sentence_validation_prompt(
            source_text,
            &unit.text,
            section.label(),
            external_reference,
            self.config.source_char_budget,
        );

        let completion = self.config.completion_config();
        let call = self
            .oracle
            .complete(vec![ChatMessage::user(prompt)], &completion);

        let response = match tokio::time::timeout(self.config.oracle_timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!(
                    section = %section,
                    index = unit.index,
                    error = %e,
                    "oracle call failed; emitting error outcome"
                );
                return ValidationOutcome::transport_error(section, unit, e.to_string());
            }
            Err(_) => {
                tracing::warn!(
                    section = %section,
                    index = unit.index,
                    timeout = ?self.config.oracle_timeout,
                    "oracle call timed out; emitting error outcome"
                );
                return ValidationOutcome::transport_error(
                    section,
                    unit,
                    format!("timeout after {:?}", self.config.oracle_timeout),
                );
            }
        };

        self.usage.record(&response.usage, &response.model);

        let decoded = decode_oracle_response(&response.content);
        let surviving = filter_issues(decoded.into_issues(), section);

        match surviving.into_iter().next() {
            None => ValidationOutcome::passed(section, unit),
            Some(issue) => outcome_from_issue(issue, section, unit),
        }
    }
}

/// Promote the first surviving raw issue into an ISSUE_FOUND outcome,
/// annotated with the sentence under test.
fn outcome_from_issue(raw: RawIssue, section: SectionKind, unit: &SentenceUnit) -> ValidationOutcome {
    ValidationOutcome {
        section,
        sentence_index: unit.index,
        status: ValidationStatus::IssueFound,
        issue_type: IssueType::from_label(&raw.issue_type),
        severity: Severity::from_label(&raw.severity),
        original_sentence: unit.text.clone(),
        source_context: raw.earning_call_context,
        issue: raw.issue,
        recommendation: raw.recommendation,
        metric: raw.metric,
        company: raw.company,
        period: raw.period,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{CompletionConfig, CompletionResponse, OracleError, TokenUsage};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Oracle double returning a fixed response body.
    struct FixedOracle {
        body: String,
    }

    #[async_trait]
    impl LlmOracle for FixedOracle {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, OracleError> {
            Ok(CompletionResponse {
                content: self.body.clone(),
                usage: TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                },
                model: "mock".to_string(),
                stop_reason: Some("end_turn".to_string()),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    /// Oracle double that always fails.
    struct FailingOracle;

    #[async_trait]
    impl LlmOracle for FailingOracle {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, OracleError> {
            Err(OracleError::HttpError("connection refused".to_string()))
        }

        async fn health_check(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Oracle double that never responds.
    struct HangingOracle;

    #[async_trait]
    impl LlmOracle for HangingOracle {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, OracleError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            unreachable!()
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "hanging"
        }
    }

    fn validator_with(oracle: Arc<dyn LlmOracle>) -> SentenceValidator {
        SentenceValidator::new(oracle, RuntimeConfig::default(), Arc::new(UsageTracker::new()))
    }

    fn unit() -> SentenceUnit {
        SentenceUnit {
            index: 1,
            text: "매출액 5조원을 기록했다.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_clean_response_passes() {
        let validator = validator_with(Arc::new(FixedOracle {
            body: r#"{"issues": []}"#.to_string(),
        }));

        let outcome = validator
            .validate("원문이다.", SectionKind::Performance, &unit(), None)
            .await;

        assert_eq!(outcome.status, ValidationStatus::Passed);
        assert_eq!(outcome.recommendation, unit().text);
    }

    #[tokio::test]
    async fn test_issue_response_surfaces_first_issue() {
        let body = r#"{"issues": [{
            "issue_type": "수치오류",
            "severity": "Critical",
            "metric": "매출액",
            "earning_call_context": "매출액은 3조 4,510억원입니다.",
            "issue": "숫자가 원문과 다름",
            "recommendation": "매출액 3조 4,510억원을 기록했다."
        }, {
            "issue_type": "과장",
            "severity": "Low",
            "recommendation": "두 번째 이슈 수정 문장이다."
        }]}"#;
        let validator = validator_with(Arc::new(FixedOracle {
            body: body.to_string(),
        }));

        let outcome = validator
            .validate("원문이다.", SectionKind::Performance, &unit(), None)
            .await;

        assert_eq!(outcome.status, ValidationStatus::IssueFound);
        assert_eq!(outcome.issue_type, Some(IssueType::NumericError));
        assert_eq!(outcome.severity, Severity::Critical);
        assert_eq!(outcome.original_sentence, unit().text);
        assert_eq!(outcome.sentence_index, 1);
    }

    #[tokio::test]
    async fn test_deletion_only_issues_collapse_to_passed() {
        let body = r#"{"issues": [{
            "severity": "High",
            "recommendation": "이 문장을 삭제하세요"
        }]}"#;
        let validator = validator_with(Arc::new(FixedOracle {
            body: body.to_string(),
        }));

        let outcome = validator
            .validate("원문이다.", SectionKind::Guidance, &unit(), None)
            .await;

        assert_eq!(outcome.status, ValidationStatus::Passed);
    }

    #[tokio::test]
    async fn test_malformed_response_is_fail_soft_passed() {
        let validator = validator_with(Arc::new(FixedOracle {
            body: "죄송합니다, JSON을 생성할 수 없습니다".to_string(),
        }));

        let outcome = validator
            .validate("원문이다.", SectionKind::Qa, &unit(), None)
            .await;

        assert_eq!(outcome.status, ValidationStatus::Passed);
        assert_eq!(outcome.recommendation, unit().text);
    }

    #[tokio::test]
    async fn test_transport_failure_yields_error_outcome() {
        let validator = validator_with(Arc::new(FailingOracle));

        let outcome = validator
            .validate("원문이다.", SectionKind::Performance, &unit(), None)
            .await;

        assert_eq!(outcome.status, ValidationStatus::Error);
        assert_eq!(outcome.severity, Severity::Low);
        assert_eq!(outcome.recommendation, unit().text);
        assert!(outcome.issue.contains("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_error_outcome() {
        let validator = validator_with(Arc::new(HangingOracle));

        let outcome = validator
            .validate("원문이다.", SectionKind::Performance, &unit(), None)
            .await;

        assert_eq!(outcome.status, ValidationStatus::Error);
        assert!(outcome.issue.contains("timeout"));
    }

    #[tokio::test]
    async fn test_usage_recorded_on_success() {
        let usage = Arc::new(UsageTracker::new());
        let validator = SentenceValidator::new(
            Arc::new(FixedOracle {
                body: r#"{"issues": []}"#.to_string(),
            }),
            RuntimeConfig::default(),
            usage.clone(),
        );

        validator
            .validate("원문이다.", SectionKind::Performance, &unit(), None)
            .await;

        let snapshot = usage.snapshot();
        assert_eq!(snapshot.oracle_calls, 1);
        assert_eq!(snapshot.total_tokens, 15);
    }
}
