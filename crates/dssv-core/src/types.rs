//! Shared data model for the validation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a document within one validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    /// The authoritative earning-call transcript.
    Source,
    /// The structured summary (DSS) under validation.
    Summary,
}

/// An ingested document. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub role: DocumentRole,
}

impl Document {
    /// Create a source (earning-call) document.
    pub fn source(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            role: DocumentRole::Source,
        }
    }

    /// Create a summary (DSS) document.
    pub fn summary(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            role: DocumentRole::Summary,
        }
    }
}

/// Named partition of a summary document.
///
/// Declaration order is report order; `Ord` relies on it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SectionKind {
    #[serde(rename = "실적")]
    Performance,
    #[serde(rename = "가이던스")]
    Guidance,
    #[serde(rename = "Q&A")]
    Qa,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [
        SectionKind::Performance,
        SectionKind::Guidance,
        SectionKind::Qa,
    ];

    /// Korean label used in prompts and in report `type` fields.
    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::Performance => "실적",
            SectionKind::Guidance => "가이던스",
            SectionKind::Qa => "Q&A",
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One classified section of a summary document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub text: String,
}

/// Smallest fragment independently sent for validation.
///
/// Invariants: `index` is 1-based within its section; `text` always ends
/// with a terminal period; the segmenter never splits between digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceUnit {
    pub index: usize,
    pub text: String,
}

/// Category of a confirmed faithfulness issue.
///
/// Serialized with the Korean tokens the oracle is instructed to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueType {
    #[serde(rename = "수치오류")]
    NumericError,
    #[serde(rename = "과장")]
    Exaggeration,
    #[serde(rename = "축소")]
    Understatement,
    #[serde(rename = "확대해석")]
    Overinterpretation,
    #[serde(rename = "문맥누락")]
    MissingContext,
    #[serde(rename = "조건무시")]
    IgnoredCondition,
}

impl IssueType {
    /// Korean wire label for this issue type.
    pub fn label(&self) -> &'static str {
        match self {
            IssueType::NumericError => "수치오류",
            IssueType::Exaggeration => "과장",
            IssueType::Understatement => "축소",
            IssueType::Overinterpretation => "확대해석",
            IssueType::MissingContext => "문맥누락",
            IssueType::IgnoredCondition => "조건무시",
        }
    }

    /// Parse the oracle's `issue_type` label, tolerating surrounding noise.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        for (token, kind) in [
            ("수치오류", IssueType::NumericError),
            ("과장", IssueType::Exaggeration),
            ("축소", IssueType::Understatement),
            ("확대해석", IssueType::Overinterpretation),
            ("문맥누락", IssueType::MissingContext),
            ("조건무시", IssueType::IgnoredCondition),
        ] {
            if label.contains(token) {
                return Some(kind);
            }
        }
        None
    }
}

/// Severity of an issue, most severe first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Severity {
    Critical,
    High,
    Medium,
    #[default]
    Low,
}

impl Severity {
    /// Parse the oracle's `severity` label, defaulting to `Low`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

/// Terminal state of one sentence validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// No issue found; `recommendation` equals the original sentence.
    Passed,
    /// At least one issue survived the filter; the first one is reported.
    IssueFound,
    /// The oracle call itself failed; fail-soft terminal outcome.
    Error,
}

/// Metric label for a sentence that validated clean.
pub const METRIC_MATCHED: &str = "일치함";
/// Metric label for a sentence whose validation call failed.
pub const METRIC_VALIDATION_ERROR: &str = "검수 오류";
/// Metric label when the oracle omitted the field.
pub const METRIC_GENERAL: &str = "전반적 내용";

/// Exactly one outcome per [`SentenceUnit`] — the atomic unit the rest of
/// the pipeline reasons about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    #[serde(rename = "type")]
    pub section: SectionKind,
    pub sentence_index: usize,
    #[serde(rename = "validation_status")]
    pub status: ValidationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    pub severity: Severity,
    #[serde(rename = "dss_sentence")]
    pub original_sentence: String,
    #[serde(rename = "earning_call_context")]
    pub source_context: String,
    pub issue: String,
    /// Always a complete replacement sentence, never an instruction to
    /// delete content (enforced by the recommendation filter).
    pub recommendation: String,
    pub metric: String,
    pub company: String,
    pub period: String,
}

impl ValidationOutcome {
    /// Passed-state contract: the recommendation is the sentence itself,
    /// signalling "no change needed".
    pub fn passed(section: SectionKind, unit: &SentenceUnit) -> Self {
        Self {
            section,
            sentence_index: unit.index,
            status: ValidationStatus::Passed,
            issue_type: None,
            severity: Severity::Low,
            original_sentence: unit.text.clone(),
            source_context: String::new(),
            issue: String::new(),
            recommendation: unit.text.clone(),
            metric: METRIC_MATCHED.to_string(),
            company: String::new(),
            period: String::new(),
        }
    }

    /// Fail-soft outcome for an oracle transport failure. Not a retry
    /// trigger; the sentence is reported as unverified.
    pub fn transport_error(
        section: SectionKind,
        unit: &SentenceUnit,
        description: impl Into<String>,
    ) -> Self {
        Self {
            section,
            sentence_index: unit.index,
            status: ValidationStatus::Error,
            issue_type: None,
            severity: Severity::Low,
            original_sentence: unit.text.clone(),
            source_context: String::new(),
            issue: format!("검증 중 오류 발생: {}", description.into()),
            recommendation: unit.text.clone(),
            metric: METRIC_VALIDATION_ERROR.to_string(),
            company: String::new(),
            period: String::new(),
        }
    }

    /// Whether this outcome counts as an issue for scoring.
    pub fn is_issue(&self) -> bool {
        self.status == ValidationStatus::IssueFound
    }
}

/// Qualitative document-level faithfulness label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faithfulness {
    Good,
    Fair,
    Poor,
}

/// Document-level assessment, recomputed fresh from the full outcome list
/// on every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateAssessment {
    /// 0..=100, severity-weighted.
    pub accuracy_score: u8,
    pub faithfulness: Faithfulness,
    /// Critical + High issue count.
    pub major_issues_count: usize,
    pub summary: String,
    /// Every outcome, in (section, sentence index) order.
    pub issues: Vec<ValidationOutcome>,
    pub evaluated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_constructors_set_roles() {
        let source = Document::source("어닝콜 원문");
        assert_eq!(source.role, DocumentRole::Source);

        let summary = Document::summary("DSS 요약");
        assert_eq!(summary.role, DocumentRole::Summary);
        assert_eq!(summary.text, "DSS 요약");
    }

    #[test]
    fn test_section_order_is_report_order() {
        assert!(SectionKind::Performance < SectionKind::Guidance);
        assert!(SectionKind::Guidance < SectionKind::Qa);
    }

    #[test]
    fn test_issue_type_labels_roundtrip() {
        assert_eq!(IssueType::from_label("수치오류"), Some(IssueType::NumericError));
        assert_eq!(
            IssueType::from_label(" 문맥누락 "),
            Some(IssueType::MissingContext)
        );
        assert_eq!(IssueType::from_label("기타"), None);
    }

    #[test]
    fn test_severity_parsing_is_lenient() {
        assert_eq!(Severity::from_label("Critical"), Severity::Critical);
        assert_eq!(Severity::from_label("HIGH"), Severity::High);
        assert_eq!(Severity::from_label("medium "), Severity::Medium);
        assert_eq!(Severity::from_label("unknown"), Severity::Low);
    }

    #[test]
    fn test_passed_outcome_contract() {
        let unit = SentenceUnit {
            index: 3,
            text: "매출이 증가했다.".to_string(),
        };
        let outcome = ValidationOutcome::passed(SectionKind::Performance, &unit);

        assert_eq!(outcome.recommendation, unit.text);
        assert_eq!(outcome.sentence_index, 3);
        assert_eq!(outcome.metric, METRIC_MATCHED);
        assert!(!outcome.is_issue());
    }

    #[test]
    fn test_outcome_serializes_wire_names() {
        let unit = SentenceUnit {
            index: 1,
            text: "문장.".to_string(),
        };
        let outcome = ValidationOutcome::passed(SectionKind::Qa, &unit);
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["type"], "Q&A");
        assert_eq!(json["validation_status"], "passed");
        assert_eq!(json["dss_sentence"], "문장.");
    }
}
