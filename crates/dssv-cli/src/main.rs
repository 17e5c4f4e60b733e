//! `dssv` — validate a DSS summary against an earning-call transcript.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dssv_core::Document;
use dssv_runtime::{
    AnthropicOracle, CorrectionGenerator, RuntimeConfig, UsageTracker, ValidationOrchestrator,
};

#[derive(Parser, Debug)]
#[command(name = "dssv", version, about = "DSS faithfulness validation")]
struct Args {
    /// Earning-call transcript file
    source: PathBuf,

    /// DSS summary file
    summary: PathBuf,

    /// Optional external corroborating reference file
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Runtime config YAML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Oracle model override
    #[arg(long)]
    model: Option<String>,

    /// Also generate a corrected summary from high-severity issues
    #[arg(long)]
    corrected: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    if let Some(model) = args.model {
        config.model = model;
    }

    let source = Document::source(
        std::fs::read_to_string(&args.source)
            .with_context(|| format!("failed to read source {}", args.source.display()))?,
    );
    let summary = Document::summary(
        std::fs::read_to_string(&args.summary)
            .with_context(|| format!("failed to read summary {}", args.summary.display()))?,
    );
    let reference_text = match &args.reference {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read reference {}", path.display()))?,
        ),
        None => None,
    };

    let oracle = Arc::new(AnthropicOracle::from_env().context("oracle not configured")?);
    let orchestrator = ValidationOrchestrator::new(oracle.clone(), config.clone());

    let assessment = orchestrator
        .validate(&source.text, &summary.text, reference_text.as_deref())
        .await
        .context("validation failed")?;

    let corrected = if args.corrected {
        let generator =
            CorrectionGenerator::new(oracle, config, Arc::new(UsageTracker::new()));
        Some(
            generator
                .generate(&summary.text, &source.text, &[], &assessment.issues)
                .await,
        )
    } else {
        None
    };

    let mut report = serde_json::json!({
        "overall_assessment": {
            "accuracy_score": assessment.accuracy_score,
            "faithfulness": assessment.faithfulness,
            "major_issues_count": assessment.major_issues_count,
            "summary": assessment.summary,
        },
        "interpretation_issues": assessment.issues,
        "evaluated_at": assessment.evaluated_at,
        "usage": orchestrator.usage(),
    });
    if let Some(corrected) = corrected {
        report["corrected_dss"] = serde_json::Value::String(corrected);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
