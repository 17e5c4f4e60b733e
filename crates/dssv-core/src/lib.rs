//! # dssv-core
//!
//! Deterministic engine for validating a structured summary (DSS) against
//! an earning-call transcript: section classification, sentence
//! segmentation, oracle response decoding, recommendation filtering, and
//! document-level scoring.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces the same sections,
//!    units, decode result, and score
//! 2. **No LLM calls**: Everything here is pure computation; the oracle
//!    lives in `dssv-runtime`
//! 3. **Fail-soft**: Malformed oracle output decodes to a no-issue
//!    fallback, never an error
//! 4. **Parallel-safe**: No shared mutable state anywhere
//!
//! ## Example
//!
//! ```rust,ignore
//! use dssv_core::{classify, split_sentences, decode_oracle_response};
//!
//! let sections = classify(summary_text);
//! for section in &sections {
//!     for unit in split_sentences(&section.text) {
//!         let raw = oracle.validate(source_text, &unit.text)?;
//!         let decoded = decode_oracle_response(&raw);
//!         // ...
//!     }
//! }
//! ```

pub mod aggregate;
pub mod decode;
pub mod filter;
pub mod sections;
pub mod segment;
pub mod types;

// Re-export main types at crate root
pub use aggregate::aggregate;
pub use decode::{decode_oracle_response, DecodeResult, RawIssue};
pub use filter::{filter_issues, is_deletion_recommendation, BANNED_RECOMMENDATION_PHRASES};
pub use sections::{classify, step, ClassifierState, LineDisposition};
pub use segment::split_sentences;
pub use types::{
    AggregateAssessment, Document, DocumentRole, Faithfulness, IssueType, Section, SectionKind,
    SentenceUnit, Severity, ValidationOutcome, ValidationStatus,
};
