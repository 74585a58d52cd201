use greenlight_core::orchestrator::RunReport;
use greenlight_core::types::ApprovalOutcome;
use serde::Serialize;
use std::io::Write;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Human- or JSON-format the run result on stdout.
pub fn emit_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(report);
    }
    match &report.outcome {
        ApprovalOutcome::Approved { by, via, .. } => {
            println!(
                "approved by {} via {} (comment {})",
                by.login, via, report.comment_id
            );
        }
        ApprovalOutcome::Rejected { by } => {
            println!("rejected by {} (comment {})", by.login, report.comment_id);
        }
        ApprovalOutcome::TimedOut => {
            println!("timed out waiting for approval (comment {})", report.comment_id);
        }
    }
    Ok(())
}

/// Append the report's named outputs as `name=value` lines to the file
/// `$GITHUB_OUTPUT` points at, when running under a workflow. A no-op
/// elsewhere.
pub fn publish_outputs(report: &RunReport) -> anyhow::Result<()> {
    let Ok(path) = std::env::var("GITHUB_OUTPUT") else {
        return Ok(());
    };
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    for (name, value) in report.outputs() {
        writeln!(file, "{name}={value}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
