//! Document-level aggregation of per-sentence outcomes.
//!
//! The scoring rubric is fixed and deterministic: identical outcome
//! multisets produce identical scores and labels regardless of input
//! order. The reported issue list is re-sorted into original
//! (section, sentence index) order for downstream consumers.

use chrono::Utc;

use crate::types::{
    AggregateAssessment, Faithfulness, Severity, ValidationOutcome,
};

/// Per-severity score deductions.
const CRITICAL_PENALTY: i64 = 20;
const HIGH_PENALTY: i64 = 10;
const OTHER_PENALTY: i64 = 3;

/// Combine all outcomes of one run into a document-level assessment.
///
/// Only ISSUE_FOUND outcomes count toward the score; passed and errored
/// sentences appear in the report list but never in the counts.
pub fn aggregate(mut outcomes: Vec<ValidationOutcome>) -> AggregateAssessment {
    outcomes.sort_by_key(|o| (o.section, o.sentence_index));

    let total_issues = outcomes.iter().filter(|o| o.is_issue()).count();
    let critical_count = count_issues(&outcomes, Severity::Critical);
    let high_count = count_issues(&outcomes, Severity::High);
    let other_count = total_issues - critical_count - high_count;

    let deduction = CRITICAL_PENALTY * critical_count as i64
        + HIGH_PENALTY * high_count as i64
        + OTHER_PENALTY * other_count as i64;
    let accuracy_score = (100 - deduction).max(0) as u8;

    let (faithfulness, summary) = if total_issues == 0 {
        (
            Faithfulness::Good,
            "DSS가 어닝콜 내용을 정확하게 반영했습니다.".to_string(),
        )
    } else if critical_count > 0 || high_count > 3 {
        (
            Faithfulness::Poor,
            format!(
                "심각한 문제 {critical_count}건, 주요 문제 {high_count}건 발견. 수정 필요."
            ),
        )
    } else if high_count > 0 {
        (
            Faithfulness::Fair,
            format!("주요 문제 {high_count}건 발견. 일부 수정 권장."),
        )
    } else {
        (
            Faithfulness::Good,
            format!("경미한 문제 {total_issues}건만 발견. 전반적으로 양호."),
        )
    };

    AggregateAssessment {
        accuracy_score,
        faithfulness,
        major_issues_count: critical_count + high_count,
        summary,
        issues: outcomes,
        evaluated_at: Utc::now(),
    }
}

fn count_issues(outcomes: &[ValidationOutcome], severity: Severity) -> usize {
    outcomes
        .iter()
        .filter(|o| o.is_issue() && o.severity == severity)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SectionKind, SentenceUnit, ValidationStatus};

    fn passed(section: SectionKind, index: usize) -> ValidationOutcome {
        let unit = SentenceUnit {
            index,
            text: format!("{index}번째 문장이다."),
        };
        ValidationOutcome::passed(section, &unit)
    }

    fn issue(section: SectionKind, index: usize, severity: Severity) -> ValidationOutcome {
        let mut outcome = passed(section, index);
        outcome.status = ValidationStatus::IssueFound;
        outcome.severity = severity;
        outcome.issue = "숫자가 원문과 다름".to_string();
        outcome.recommendation = "수정된 문장이다.".to_string();
        outcome
    }

    #[test]
    fn test_zero_issues_is_good_100() {
        let assessment = aggregate(vec![
            passed(SectionKind::Performance, 1),
            passed(SectionKind::Guidance, 1),
        ]);

        assert_eq!(assessment.accuracy_score, 100);
        assert_eq!(assessment.faithfulness, Faithfulness::Good);
        assert_eq!(assessment.major_issues_count, 0);
    }

    #[test]
    fn test_one_critical_one_high_is_poor_70() {
        let assessment = aggregate(vec![
            issue(SectionKind::Performance, 1, Severity::Critical),
            issue(SectionKind::Performance, 2, Severity::High),
        ]);

        assert_eq!(assessment.accuracy_score, 70);
        assert_eq!(assessment.faithfulness, Faithfulness::Poor);
        assert_eq!(assessment.major_issues_count, 2);
    }

    #[test]
    fn test_four_highs_is_poor_60() {
        let outcomes = (1..=4)
            .map(|i| issue(SectionKind::Guidance, i, Severity::High))
            .collect();
        let assessment = aggregate(outcomes);

        assert_eq!(assessment.accuracy_score, 60);
        assert_eq!(assessment.faithfulness, Faithfulness::Poor);
    }

    #[test]
    fn test_single_medium_is_good_97() {
        let assessment = aggregate(vec![issue(SectionKind::Qa, 1, Severity::Medium)]);

        assert_eq!(assessment.accuracy_score, 97);
        assert_eq!(assessment.faithfulness, Faithfulness::Good);
        assert_eq!(assessment.major_issues_count, 0);
    }

    #[test]
    fn test_highs_without_critical_is_fair() {
        let assessment = aggregate(vec![
            issue(SectionKind::Performance, 1, Severity::High),
            issue(SectionKind::Performance, 2, Severity::Low),
        ]);

        assert_eq!(assessment.faithfulness, Faithfulness::Fair);
        assert_eq!(assessment.accuracy_score, 100 - 10 - 3);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let outcomes = (1..=10)
            .map(|i| issue(SectionKind::Performance, i, Severity::Critical))
            .collect();
        let assessment = aggregate(outcomes);

        assert_eq!(assessment.accuracy_score, 0);
    }

    #[test]
    fn test_error_outcomes_do_not_count_as_issues() {
        let unit = SentenceUnit {
            index: 1,
            text: "문장이다.".to_string(),
        };
        let errored =
            ValidationOutcome::transport_error(SectionKind::Performance, &unit, "timeout");

        let assessment = aggregate(vec![errored, passed(SectionKind::Performance, 2)]);
        assert_eq!(assessment.accuracy_score, 100);
        assert_eq!(assessment.faithfulness, Faithfulness::Good);
        // The errored sentence still appears in the report.
        assert_eq!(assessment.issues.len(), 2);
    }

    #[test]
    fn test_issues_resorted_into_section_and_index_order() {
        let assessment = aggregate(vec![
            issue(SectionKind::Qa, 1, Severity::Low),
            issue(SectionKind::Performance, 2, Severity::Low),
            issue(SectionKind::Guidance, 1, Severity::Low),
            issue(SectionKind::Performance, 1, Severity::Low),
        ]);

        let order: Vec<(SectionKind, usize)> = assessment
            .issues
            .iter()
            .map(|o| (o.section, o.sentence_index))
            .collect();
        assert_eq!(
            order,
            vec![
                (SectionKind::Performance, 1),
                (SectionKind::Performance, 2),
                (SectionKind::Guidance, 1),
                (SectionKind::Qa, 1),
            ]
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arbitrary_outcomes() -> impl Strategy<Value = Vec<ValidationOutcome>> {
            prop::collection::vec(
                (
                    prop::sample::select(vec![
                        SectionKind::Performance,
                        SectionKind::Guidance,
                        SectionKind::Qa,
                    ]),
                    1usize..50,
                    prop::sample::select(vec![
                        Severity::Critical,
                        Severity::High,
                        Severity::Medium,
                        Severity::Low,
                    ]),
                    prop::bool::ANY,
                ),
                0..20,
            )
            .prop_map(|entries| {
                entries
                    .into_iter()
                    .map(|(section, index, severity, is_issue)| {
                        if is_issue {
                            issue(section, index, severity)
                        } else {
                            passed(section, index)
                        }
                    })
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn score_and_label_are_permutation_invariant(
                outcomes in arbitrary_outcomes(),
                rotation in 0usize..20,
            ) {
                let mut reversed = outcomes.clone();
                reversed.reverse();

                let mut rotated = outcomes.clone();
                if !rotated.is_empty() {
                    let split = rotation % rotated.len();
                    rotated.rotate_left(split);
                }

                let original = aggregate(outcomes);
                for permuted in [aggregate(reversed), aggregate(rotated)] {
                    prop_assert_eq!(original.accuracy_score, permuted.accuracy_score);
                    prop_assert_eq!(original.faithfulness, permuted.faithfulness);
                    prop_assert_eq!(
                        original.major_issues_count,
                        permuted.major_issues_count
                    );
                }
            }
        }
    }
}
