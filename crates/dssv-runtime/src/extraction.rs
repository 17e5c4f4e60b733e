//! Batch financial-metric extraction at the interface boundary.
//!
//! One combined request covers both documents; a structurally invalid
//! response falls back to two independent single-document requests.
//! Deep normalization (unit conversion, metric synonyms) is handled by
//! the external comparison collaborator, not here.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use dssv_core::decode::strip_code_fence;

use crate::config::RuntimeConfig;
use crate::oracle::{ChatMessage, LlmOracle};
use crate::prompts;
use crate::usage::UsageTracker;

/// One extracted financial metric record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub metric: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub context: String,
    #[serde(rename = "type", default)]
    pub record_type: String,
}

/// Accept numbers, numeric strings, or null for `value`.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().replace(',', "").parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Extracts metric records from both documents.
pub struct MetricExtractor {
    oracle: Arc<dyn LlmOracle>,
    config: RuntimeConfig,
    usage: Arc<UsageTracker>,
}

impl MetricExtractor {
    pub fn new(oracle: Arc<dyn LlmOracle>, config: RuntimeConfig, usage: Arc<UsageTracker>) -> Self {
        Self {
            oracle,
            config,
            usage,
        }
    }

    /// Extract metrics from both documents with one combined request.
    ///
    /// Returns `(source_records, summary_records)`. On a structurally
    /// invalid response — neither an object with the two expected keys
    /// nor a list — falls back to two single-document requests.
    pub async fn extract_both(
        &self,
        source_text: &str,
        summary_text: &str,
    ) -> (Vec<MetricRecord>, Vec<MetricRecord>) {
        let prompt = prompts::batch_extraction_prompt(source_text, summary_text);

        let response = match self
            .oracle
            .complete(vec![ChatMessage::user(prompt)], &self.config.completion_config())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "batch extraction failed; falling back to single calls");
                return self.extract_each(source_text, summary_text).await;
            }
        };

        self.usage.record(&response.usage, &response.model);

        let body = strip_code_fence(&response.content);
        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(map)) => {
                let source = records_from(map.get("earning_call"));
                let summary = records_from(map.get("dss"));
                (dedupe(source), dedupe(summary))
            }
            Ok(Value::Array(items)) => {
                // A single flat list: split in half, best-effort.
                let records: Vec<MetricRecord> = items
                    .into_iter()
                    .filter_map(|item| serde_json::from_value(item).ok())
                    .collect();
                let mid = records.len() / 2;
                let mut source = records;
                let summary = source.split_off(mid);
                (dedupe(source), dedupe(summary))
            }
            _ => {
                tracing::warn!("batch extraction response structurally invalid; falling back");
                self.extract_each(source_text, summary_text).await
            }
        }
    }

    /// Fallback path: one request per document.
    async fn extract_each(
        &self,
        source_text: &str,
        summary_text: &str,
    ) -> (Vec<MetricRecord>, Vec<MetricRecord>) {
        let source = self
            .extract_single(source_text, "earning_call", self.config.source_char_budget)
            .await;
        let summary = self
            .extract_single(summary_text, "dss", self.config.summary_char_budget)
            .await;
        (source, summary)
    }

    async fn extract_single(
        &self,
        text: &str,
        document_type: &str,
        char_budget: usize,
    ) -> Vec<MetricRecord> {
        let prompt = prompts::single_extraction_prompt(text, document_type, char_budget);

        let response = match self
            .oracle
            .complete(vec![ChatMessage::user(prompt)], &self.config.completion_config())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, document_type, "single-document extraction failed");
                return Vec::new();
            }
        };

        self.usage.record(&response.usage, &response.model);

        let body = strip_code_fence(&response.content);
        let records = match serde_json::from_str::<Value>(&body) {
            Ok(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            // A single object is treated as a one-record list.
            Ok(object @ Value::Object(_)) => serde_json::from_value(object)
                .map(|record| vec![record])
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        dedupe(records)
    }
}

fn records_from(value: Option<&Value>) -> Vec<MetricRecord> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Drop duplicate (company, period, metric) records, keeping the first.
fn dedupe(records: Vec<MetricRecord>) -> Vec<MetricRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            seen.insert((
                record.company.trim().to_string(),
                record.period.trim().to_string(),
                record.metric.trim().to_string(),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{CompletionConfig, CompletionResponse, OracleError, TokenUsage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// First response is the batch answer; later calls get the single
    /// answer.
    struct SequencedOracle {
        batch_body: String,
        single_body: String,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmOracle for SequencedOracle {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, OracleError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let content = if call == 0 {
                self.batch_body.clone()
            } else {
                self.single_body.clone()
            };
            Ok(CompletionResponse {
                content,
                usage: TokenUsage::default(),
                model: "mock".to_string(),
                stop_reason: None,
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "sequenced"
        }
    }

    fn extractor(batch_body: &str, single_body: &str) -> (MetricExtractor, Arc<SequencedOracle>) {
        let oracle = Arc::new(SequencedOracle {
            batch_body: batch_body.to_string(),
            single_body: single_body.to_string(),
            calls: AtomicU32::new(0),
        });
        (
            MetricExtractor::new(
                oracle.clone(),
                RuntimeConfig::default(),
                Arc::new(UsageTracker::new()),
            ),
            oracle,
        )
    }

    const BATCH_OK: &str = r#"{
        "earning_call": [
            {"company": "테크코리아", "period": "2025-Q4", "metric": "매출액", "value": 1.5, "unit": "조원", "context": "매출은 1.5조원", "type": "실적"}
        ],
        "dss": [
            {"company": "테크코리아", "period": "2025-Q4", "metric": "매출액", "value": 1.5, "unit": "조원", "context": "매출 1.5조원", "type": "실적"}
        ]
    }"#;

    #[tokio::test]
    async fn test_batch_object_splits_into_two_lists() {
        let (extractor, oracle) = extractor(BATCH_OK, "[]");

        let (source, summary) = extractor.extract_both("원문", "요약").await;

        assert_eq!(source.len(), 1);
        assert_eq!(summary.len(), 1);
        assert_eq!(source[0].metric, "매출액");
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bare_list_is_halved() {
        let batch = r#"[
            {"metric": "매출액", "value": 1.5},
            {"metric": "영업이익", "value": 500},
            {"metric": "매출액", "value": 1.4},
            {"metric": "영업이익", "value": 480}
        ]"#;
        let (extractor, _) = extractor(batch, "[]");

        let (source, summary) = extractor.extract_both("원문", "요약").await;

        assert_eq!(source.len(), 2);
        assert_eq!(summary.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_shape_falls_back_to_single_calls() {
        let single = r#"[{"company": "테크코리아", "metric": "매출액", "value": "1,250"}]"#;
        let (extractor, oracle) = extractor(r#""그냥 문자열""#, single);

        let (source, summary) = extractor.extract_both("원문", "요약").await;

        // 1 failed batch call + 2 single-document calls.
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
        assert_eq!(source.len(), 1);
        assert_eq!(summary.len(), 1);
        // Numeric string coerced leniently.
        assert_eq!(source[0].value, 1250.0);
    }

    #[tokio::test]
    async fn test_duplicate_records_deduped() {
        let batch = r#"{
            "earning_call": [
                {"company": "A", "period": "2025-Q4", "metric": "매출액", "value": 1.0},
                {"company": "A", "period": "2025-Q4", "metric": "매출액", "value": 2.0}
            ],
            "dss": []
        }"#;
        let (extractor, _) = extractor(batch, "[]");

        let (source, _) = extractor.extract_both("원문", "요약").await;

        assert_eq!(source.len(), 1);
        assert_eq!(source[0].value, 1.0);
    }

    #[tokio::test]
    async fn test_malformed_record_skipped_not_fatal() {
        let batch = r#"{
            "earning_call": [
                {"metric": "매출액", "value": 1.0},
                "잘못된 레코드"
            ],
            "dss": []
        }"#;
        let (extractor, _) = extractor(batch, "[]");

        let (source, _) = extractor.extract_both("원문", "요약").await;
        assert_eq!(source.len(), 1);
    }
}
