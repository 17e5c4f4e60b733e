//! # dssv-runtime
//!
//! Async validation pipeline over the deterministic `dssv-core` engine.
//!
//! The reasoning oracle is injected as a capability ([`LlmOracle`]); the
//! orchestrator fans sentence validations out through a bounded worker
//! pool and fans outcomes back in, in order. The oracle call is the only
//! blocking operation in the pipeline and the only place failures can
//! originate; every per-sentence failure is converted into a fail-soft
//! outcome rather than propagated.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dssv_runtime::{AnthropicOracle, RuntimeConfig, ValidationOrchestrator};
//!
//! let oracle = Arc::new(AnthropicOracle::from_env()?);
//! let orchestrator = ValidationOrchestrator::new(oracle, RuntimeConfig::default());
//! let assessment = orchestrator.validate(&source, &summary, None).await?;
//! println!("{} ({:?})", assessment.accuracy_score, assessment.faithfulness);
//! ```

pub mod config;
pub mod correction;
pub mod extraction;
pub mod oracle;
pub mod orchestrator;
pub mod prompts;
pub mod usage;
pub mod validator;

// Re-export main types at crate root
pub use config::{ConfigError, RuntimeConfig};
pub use correction::{CorrectionGenerator, NumericCorrection};
pub use extraction::{MetricExtractor, MetricRecord};
pub use oracle::{
    AnthropicOracle, ApiCredential, ChatMessage, CompletionConfig, CompletionResponse,
    CredentialSource, LlmOracle, OracleError, TokenUsage,
};
pub use orchestrator::{PipelineError, ValidationOrchestrator};
pub use usage::{OracleUsage, UsageTracker};
pub use validator::SentenceValidator;
