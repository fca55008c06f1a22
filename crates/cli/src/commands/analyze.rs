use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;

use binsight_core::analysis::strings::StringExtractor;
use binsight_core::model::AnalysisResult;
use binsight_core::services::analysis::{CancelSource, Orchestrator, TaskOutcome, TaskStatus};
use binsight_core::services::insight::default_capability_registry;

use crate::{absolute_path, resolve_settings, sha256_hex};

/// Flags accepted by `analyze`.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeArgs {
    pub path: String,
    pub config: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
    pub builtin_strings: bool,
    pub json: bool,
    pub out: Option<String>,
}

/// Report written by `analyze`: the merged result plus run metadata.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub tool_version: String,
    pub capability: String,
    pub path: String,
    pub sha256: String,
    pub started_at: String,
    pub finished_at: String,
    pub inconclusive: bool,
    pub result: AnalysisResult,
    pub tasks: Vec<TaskOutcome>,
}

/// Analyze a file with the selected insight capability.
///
/// Ctrl-C cancels the tasks still running; whatever was collected is still reported.
pub async fn analyze_command(args: AnalyzeArgs) -> Result<()> {
    let mut settings = resolve_settings(args.config.as_deref())?;
    if let Some(model) = args.model {
        settings.model = model;
    }
    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(secs) = args.timeout_secs {
        settings.task_timeout_secs = secs;
    }
    let settings = settings.with_defaults();

    let registry = default_capability_registry();
    let mut orchestrator = Orchestrator::from_settings(&registry, &settings)
        .with_context(|| format!("Failed to set up capability '{}'", settings.model))?;
    if args.builtin_strings {
        let inspector = settings.inspector().with_strings(StringExtractor::builtin());
        orchestrator = orchestrator.with_inspector(inspector);
    }

    let path = absolute_path(Path::new(&args.path))?;
    let started_at = now_rfc3339();

    let source = CancelSource::new();
    let token = source.token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling analysis");
            source.cancel();
        }
    });
    let run = orchestrator.analyze_detailed(&path, token).await;
    interrupt.abort();
    let run = run.with_context(|| format!("Failed to analyze {}", path.display()))?;

    let report = AnalysisReport {
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        capability: orchestrator.capability_name().to_string(),
        path: path.display().to_string(),
        sha256: sha256_hex(&run.bytes),
        started_at,
        finished_at: now_rfc3339(),
        inconclusive: run.result.is_inconclusive(),
        result: run.result,
        tasks: run.outcomes,
    };

    if let Some(out) = &args.out {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(out, json).with_context(|| format!("Failed to write report to {}", out))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn status_label(status: &TaskStatus) -> String {
    match status {
        TaskStatus::Succeeded { items } => format!("succeeded ({items} items)"),
        TaskStatus::Failed { reason } => format!("failed: {reason}"),
        TaskStatus::TimedOut => "timed out".to_string(),
        TaskStatus::Cancelled => "cancelled".to_string(),
    }
}

pub fn print_report(report: &AnalysisReport) {
    let result = &report.result;
    println!("File: {} ({} bytes)", result.filename, result.file_size);
    println!("Type: {}", result.file_type);
    println!("SHA-256: {}", report.sha256);
    println!("Capability: {}", report.capability);

    if report.inconclusive {
        println!("No analysis task produced results (inconclusive).");
    }

    if !result.findings.is_empty() {
        println!("Findings ({}):", result.findings.len());
        for f in &result.findings {
            println!("- [{}] {}: {} @ {}", f.severity, f.category, f.description, f.location);
        }
    }

    if !result.vulnerabilities.is_empty() {
        println!("Vulnerabilities ({}):", result.vulnerabilities.len());
        for v in &result.vulnerabilities {
            println!(
                "- [{}, CVSS {:.1}] {}: {} @ {}",
                v.severity, v.cvss, v.category, v.description, v.location
            );
            if !v.remediation.is_empty() {
                println!("  Remediation: {}", v.remediation);
            }
        }
    }

    if !result.summary.is_empty() {
        println!("Summary:");
        for line in result.summary.lines() {
            println!("  {}", line);
        }
    }

    println!("Tasks:");
    for outcome in &report.tasks {
        println!("- {}: {}", outcome.task.label(), status_label(&outcome.status));
    }
}
