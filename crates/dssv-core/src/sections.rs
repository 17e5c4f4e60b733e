//! Section classification for summary documents.
//!
//! A summary is partitioned into named sections (실적 / 가이던스 / Q&A) by
//! scanning lines in order. Marker-prefixed headings drive the split when
//! present; otherwise a keyword-density fallback re-classifies every line.
//!
//! Classification is an explicit fold over lines: `step` takes the current
//! state and one line and returns the next state plus the line's
//! disposition. No shared mutable state, so concurrent runs are safe.

use crate::types::{Section, SectionKind};

/// Header candidates longer than this are treated as content. Protects
/// against content lines that coincidentally start with a marker.
const MAX_HEADER_CHARS: usize = 100;

const PERFORMANCE_KEYWORDS: [&str; 4] = ["실적", "실적발표", "성과", "결과"];
/// 실적 keywords are suppressed when any of these co-occur on the line.
/// GUIDANCE and QA have no analogous mutual suppression; the asymmetry is
/// intentional.
const PERFORMANCE_SUPPRESSORS: [&str; 3] = ["q&a", "가이던스", "전망"];
const GUIDANCE_KEYWORDS: [&str; 5] = ["가이던스", "전망", "계획", "목표", "가이드"];
const QA_KEYWORDS: [&str; 5] = ["q&a", "q & a", "질의", "응답", "질문"];

/// Match lowercased text against the three keyword sets, in precedence
/// order.
fn match_keywords(lowered: &str) -> Option<SectionKind> {
    let contains_any = |set: &[&str]| set.iter().any(|kw| lowered.contains(kw));

    if contains_any(&PERFORMANCE_KEYWORDS) && !contains_any(&PERFORMANCE_SUPPRESSORS) {
        Some(SectionKind::Performance)
    } else if contains_any(&GUIDANCE_KEYWORDS) {
        Some(SectionKind::Guidance)
    } else if contains_any(&QA_KEYWORDS) {
        Some(SectionKind::Qa)
    } else {
        None
    }
}

/// Classifier state carried through the fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierState {
    /// Section that content lines are currently assigned to.
    pub current: SectionKind,
    /// Whether any header candidate has keyword-matched so far.
    pub header_matched: bool,
}

impl Default for ClassifierState {
    fn default() -> Self {
        Self {
            current: SectionKind::Performance,
            header_matched: false,
        }
    }
}

/// What the fold decided about one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDisposition {
    /// A matched header; contributes no content.
    Header(SectionKind),
    /// A non-empty content line assigned to the given section.
    Content(SectionKind),
    /// Empty after trimming; skipped.
    Blank,
}

/// One state transition of the heading-driven scan.
pub fn step(state: ClassifierState, line: &str) -> (ClassifierState, LineDisposition) {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return (state, LineDisposition::Blank);
    }

    if trimmed.starts_with("##") && trimmed.chars().count() < MAX_HEADER_CHARS {
        let stripped: String = trimmed.chars().filter(|c| *c != '#').collect();
        if let Some(kind) = match_keywords(stripped.trim().to_lowercase().as_str()) {
            return (
                ClassifierState {
                    current: kind,
                    header_matched: true,
                },
                LineDisposition::Header(kind),
            );
        }
    }

    (state, LineDisposition::Content(state.current))
}

/// Split a summary document into named sections.
///
/// Every non-empty line lands in exactly one section; matched header lines
/// contribute no content. Sections empty after trimming are omitted.
/// Deterministic: identical input yields byte-identical output.
pub fn classify(text: &str) -> Vec<Section> {
    let lines: Vec<&str> = text.lines().collect();

    let mut state = ClassifierState::default();
    let mut buckets: [Vec<&str>; 3] = Default::default();

    for line in &lines {
        let (next, disposition) = step(state, line);
        if let LineDisposition::Content(kind) = disposition {
            buckets[bucket_index(kind)].push(line);
        }
        state = next;
    }

    // Without a single matched heading, structure cannot be trusted;
    // keyword density substitutes for it.
    if !state.header_matched {
        tracing::debug!("no section headers matched; falling back to keyword classification");
        buckets = classify_by_keywords(&lines);
    }

    SectionKind::ALL
        .iter()
        .filter_map(|kind| {
            let text = buckets[bucket_index(*kind)].join("\n");
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                Some(Section {
                    kind: *kind,
                    text: text.to_string(),
                })
            }
        })
        .collect()
}

/// Fallback: test every non-empty line directly against the keyword sets,
/// with no marker or length gate. The current section persists across
/// lines that match no keyword, and matching lines are kept as content.
fn classify_by_keywords<'a>(lines: &[&'a str]) -> [Vec<&'a str>; 3] {
    let mut buckets: [Vec<&str>; 3] = Default::default();
    let mut current = SectionKind::Performance;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(kind) = match_keywords(line.to_lowercase().as_str()) {
            current = kind;
        }
        buckets[bucket_index(current)].push(line);
    }

    buckets
}

fn bucket_index(kind: SectionKind) -> usize {
    match kind {
        SectionKind::Performance => 0,
        SectionKind::Guidance => 1,
        SectionKind::Qa => 2,
    }
}
