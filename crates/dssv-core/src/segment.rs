//! Sentence segmentation for section text.
//!
//! Splits at periods that terminate a sentence while protecting decimal
//! and grouped numerals: a period is a boundary only when the preceding
//! character is not a digit and the following character is whitespace (or
//! the end of the line). The `regex` crate has no look-behind, so the
//! boundary test is a hand-rolled scan.

use crate::types::SentenceUnit;

/// Split one section's text into ordered sentence units.
///
/// Lines contribute units independently; a leading `##` marker is
/// stripped from content lines. Indices are assigned 1..N over the whole
/// section. Every unit ends with a terminal period; fragments with no
/// alphanumeric content are dropped.
pub fn split_sentences(text: &str) -> Vec<SentenceUnit> {
    let mut units = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let content = match line.strip_prefix("##") {
            Some(rest) => rest.trim(),
            None => line,
        };

        for fragment in split_at_periods(content) {
            let fragment = fragment.trim();
            if fragment.is_empty() || !fragment.chars().any(char::is_alphanumeric) {
                continue;
            }
            let mut sentence = fragment.to_string();
            if !sentence.ends_with('.') {
                sentence.push('.');
            }
            units.push(SentenceUnit {
                index: units.len() + 1,
                text: sentence,
            });
        }
    }

    units
}

/// Split at boundary periods, consuming the period and any whitespace
/// that follows it. A period between digits is never a boundary.
fn split_at_periods(content: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut start = 0usize;
    let mut prev: Option<char> = None;
    let mut chars = content.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == '.' {
            let after_non_digit = prev.is_some_and(|p| !p.is_ascii_digit());
            let before_break = chars.peek().map_or(true, |(_, next)| next.is_whitespace());

            if after_non_digit && before_break {
                fragments.push(&content[start..i]);
                start = i + 1;
                while let Some(&(j, next)) = chars.peek() {
                    if !next.is_whitespace() {
                        start = j;
                        break;
                    }
                    chars.next();
                    start = j + next.len_utf8();
                }
                prev = None;
                continue;
            }
        }
        prev = Some(c);
    }

    if start < content.len() {
        fragments.push(&content[start..]);
    }
    fragments
}
