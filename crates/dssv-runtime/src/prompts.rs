//! Prompt construction for the reasoning oracle.
//!
//! Prompts are Korean IR-review instructions with fixed output contracts.
//! Document texts are budgeted before insertion; truncation is a plain
//! prefix cut at a character boundary.

use dssv_core::ValidationOutcome;

use crate::correction::NumericCorrection;

/// Budget for the source excerpt inside a correction prompt.
const CORRECTION_SOURCE_BUDGET: usize = 5_000;
/// Budget for the summary head inside a company-extraction prompt.
const COMPANY_HEAD_BUDGET: usize = 1_000;
/// Budgets for the batch extraction prompt.
const BATCH_SOURCE_BUDGET: usize = 15_000;
const BATCH_SUMMARY_BUDGET: usize = 10_000;

/// Truncate to at most `max` characters, at a character boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Prompt for validating one summary sentence against the full source.
pub fn sentence_validation_prompt(
    source_text: &str,
    sentence: &str,
    section_label: &str,
    external_reference: Option<&str>,
    source_budget: usize,
) -> String {
    let source = truncate_chars(source_text, source_budget);

    let external_context = match external_reference {
        Some(reference) if !reference.trim().is_empty() => format!(
            r#"

**외부 공식 자료 참고:**
<external_reference>
{reference}
</external_reference>

⚠️ **중요**: 숫자 검증 시 외부 공식 자료(뉴스, IR 발표자료)와도 교차 검증하세요.
- 어닝콜 원문의 숫자가 공식 발표 자료와 일치하는지 확인
- DSS의 숫자가 원문을 정확히 반영했는지 검증
- 단위 변환이 정확한지 확인 (조원, 억원 등)
"#
        ),
        _ => String::new(),
    };

    format!(
        r#"당신은 IR 자료 검수 전문가입니다.

아래는 DSS의 **{section_label}** 섹션에서 추출한 **한 개의 문장**입니다. 이 문장을 어닝콜 원문과 비교하여 검증하세요.

**어닝콜 원문 (전체):**
<earning_call>
{source}
</earning_call>

**검증할 DSS 문장:**
<dss_sentence>
{sentence}
</dss_sentence>
{external_context}
**검증 방법:**
1. 위의 DSS 문장에서 주장하는 내용을 파악하세요
2. 어닝콜 원문에서 해당 내용의 근거를 찾으세요
3. **숫자는 특히 주의깊게 검증** - 원문과 정확히 일치하는지 확인
4. 다음 문제가 있는지 체크하세요:
   - **수치 오류**: 숫자가 원문과 다름 (⚠️ 가장 중요!)
   - **과장**: 원문보다 더 긍정적으로 표현
   - **축소**: 부정적 내용이나 리스크를 축소/생략
   - **확대해석**: "~할 수 있다" → "~할 것이다" 같은 확정적 변경
   - **문맥누락**: 중요한 조건, 단서, 배경 설명 생략
   - **조건무시**: "만약", "~인 경우" 같은 조건 제거

**수정안 작성 원칙 (매우 중요!):**
🚫 **절대 금지 사항**:
   ❌ "삭제하세요", "제거하세요", "삭제", "제거" 같은 표현 금지
   ❌ "없애세요", "지우세요", "빼세요" 같은 표현 금지
   ❌ 설명이나 지시문 금지 (예: "검토가 필요합니다", "수정해야 합니다")

✅ **반드시 지켜야 할 사항**:
   1. recommendation은 **완전한 문장**만 작성하세요
   2. 원래 DSS 문장을 기반으로 **수정된 버전**을 제공하세요
   3. 숫자가 틀렸다면 → 올바른 숫자로 **교체한 문장**
   4. 문맥이 부족하다면 → 필요한 정보를 **추가한 문장**
   5. 과장되었다면 → 정확한 표현으로 **수정한 문장**
   6. 모든 recommendation은 **그대로 DSS에 복사-붙여넣기 가능**해야 합니다

⚠️ **경고**: 삭제/제거 권장은 시스템에서 자동으로 필터링되어 제외됩니다!

**반환 형식 (JSON):**
{{
  "issues": [
    {{
      "type": "{section_label}",
      "company": "회사명 (DSS에서 추출)",
      "period": "기간 (예: 2025-FY, 2025-Q4)",
      "metric": "관련 지표 (예: 매출, 영업이익)",
      "issue_type": "수치오류|과장|축소|확대해석|문맥누락|조건무시",
      "severity": "Critical|High|Medium|Low",
      "dss_statement": "문제가 있는 DSS 문장 (위의 문장 그대로)",
      "earning_call_context": "어닝콜 원문의 해당 부분",
      "issue": "무엇이 잘못되었는지",
      "recommendation": "수정된 완전한 문장 (원문을 수정한 버전, 삭제 아님)"
    }}
  ]
}}

**중요 지침:**
- 문제가 없으면 빈 issues 배열 반환: {{"issues": []}}
- 문제가 있을 때만 issues에 포함하세요
- 확실한 근거가 있을 때만 문제로 지적하세요
- **recommendation은 항상 완전한 문장이어야 합니다** (삭제나 제거가 아닌 수정)

JSON만 반환하세요. 설명이나 마크다운은 넣지 마세요."#
    )
}

/// Prompt for extracting the company name from the summary head.
pub fn company_extraction_prompt(summary_text: &str) -> String {
    let head = truncate_chars(summary_text, COMPANY_HEAD_BUDGET);
    format!(
        "다음 텍스트에서 회사명만 추출하세요. 회사명만 반환하고 다른 설명은 하지 마세요:\n\n{head}"
    )
}

/// Prompt asking the oracle to emit one corrected full-summary text.
pub fn corrected_summary_prompt(
    original_summary: &str,
    source_text: &str,
    corrections: &[NumericCorrection],
    issues: &[ValidationOutcome],
    summary_budget: usize,
) -> String {
    let corrections_block = if corrections.is_empty() {
        "없음".to_string()
    } else {
        corrections
            .iter()
            .map(|c| {
                format!(
                    "- {} ({}): {} {} → {} {} (차이: {:.1}%)",
                    c.metric,
                    c.period,
                    c.summary_value,
                    c.unit,
                    c.source_value,
                    c.unit,
                    c.difference_pct
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let issues_block = if issues.is_empty() {
        "없음".to_string()
    } else {
        issues
            .iter()
            .map(|issue| {
                let label = issue.issue_type.map(|t| t.label()).unwrap_or("기타");
                format!(
                    "- [{label}] {}\n  → {}",
                    issue.original_sentence, issue.recommendation
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let summary = truncate_chars(original_summary, summary_budget);
    let source = truncate_chars(source_text, CORRECTION_SOURCE_BUDGET);

    format!(
        r#"당신은 IR 자료 검수 전문가입니다.

아래 DSS 요약본에서 발견된 오류를 수정해주세요.

**원본 DSS:**
<original_dss>
{summary}
</original_dss>

**어닝콜 원문 (참고용):**
<earning_call>
{source}
</earning_call>

**발견된 숫자 오류:**
{corrections_block}

**발견된 해석 문제 (중요도 높음):**
{issues_block}

---

수정된 DSS를 다음 형식으로 생성해주세요:

{{
  "corrected_dss": "수정된 DSS 텍스트"
}}

**수정 원칙:**
- 숫자 오류를 정확하게 수정
- 중요한 해석 문제(과장, 축소, 확대해석, 조건 무시 등)를 수정
- 원본 문장 구조를 최대한 유지하되, 필요시 명확하게 개선
- 어닝콜 원문에 충실하게 작성

JSON만 반환하세요."#
    )
}

/// Prompt extracting financial metrics from both documents in one call.
pub fn batch_extraction_prompt(source_text: &str, summary_text: &str) -> String {
    let source = truncate_chars(source_text, BATCH_SOURCE_BUDGET);
    let summary = truncate_chars(summary_text, BATCH_SUMMARY_BUDGET);

    format!(
        r#"당신은 재무 분석 및 IR 검수 전문가입니다.

두 개의 문서에서 재무 지표, 가이던스, 주요 발언을 추출해주세요:

**문서 1 (어닝콜 원문):**
<earning_call>
{source}
</earning_call>

**문서 2 (DSS 요약):**
<dss>
{summary}
</dss>

각 문서에서 다음 정보를 추출하여 JSON 형식으로 반환해주세요:

{{
  "earning_call": [
    {{"company": "...", "period": "2024-Q4", "metric": "매출액", "value": 1250, "unit": "억원", "context": "원문 전체 문장", "type": "실적|가이던스|목표|Q&A"}}
  ],
  "dss": [
    {{"company": "...", "period": "2024-Q4", "metric": "매출액", "value": 1250, "unit": "억원", "context": "원문 전체 문장", "type": "실적|가이던스|목표|Q&A"}}
  ]
}}

**추출 규칙:**
1. **실적 수치**: 발표된 모든 실적 숫자 (매출, 영업이익, 순이익 등)
2. **가이던스**: 향후 전망, 목표치, 예상 수치
3. **Q&A 핵심 내용**: Q&A에서 언급된 중요한 숫자나 발언
4. **문맥 정확히 포함**: context에는 숫자가 언급된 전체 문장을 포함
5. **확정 vs 예상 구분**: "예상", "목표", "전망" 등의 표현이 있으면 type을 "가이던스"로
6. **조건부 발언 주의**: "만약", "경우" 등 조건이 붙은 발언은 context에 조건까지 포함

JSON만 반환하세요."#
    )
}

/// Prompt extracting metrics from a single document; fallback path when
/// the batch response is structurally invalid.
pub fn single_extraction_prompt(text: &str, document_type: &str, char_budget: usize) -> String {
    let body = truncate_chars(text, char_budget);

    format!(
        r#"당신은 재무 분석 전문가입니다. 다음 텍스트에서 모든 재무 지표를 추출하여 구조화된 JSON 형식으로 변환해주세요.

**중요:** 단순히 숫자를 추출하는 것이 아니라, **각 문장의 의미와 맥락을 정확히 이해**하여 추출해야 합니다.

<document_type>{document_type}</document_type>

<text>
{body}
</text>

**추출 규칙:**
1. 각 수치에 대해 company, period, metric, value, unit, context를 추출하세요
2. **원문의 숫자와 단위를 절대 변환하지 말고 정확히 그대로 추출하세요**
   - "1,250억원" → value: 1250, unit: "억원"
   - "2조 500억원" → value: 2.05, unit: "조원"
   - "55.0%" → value: 55.0, unit: "%"
3. 기간은 "2024-Q4", "2024-연간" 형식으로 표준화하세요
4. 증감률(%, 전년 대비)은 별도의 항목으로 추출하거나 무시하세요

**출력 형식 (JSON):**
```json
[
  {{
    "company": "회사명",
    "period": "기간",
    "metric": "지표명",
    "value": 숫자,
    "unit": "단위",
    "context": "원문 전체 문장"
  }}
]
```

JSON 배열만 출력하고, 다른 설명은 추가하지 마세요."#
    )
}
