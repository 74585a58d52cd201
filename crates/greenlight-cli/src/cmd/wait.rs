use crate::cmd::WaitArgs;
use crate::output;
use greenlight_core::backend::Backend as _;
use greenlight_core::error::GateError;
use greenlight_core::orchestrator::Orchestrator;
use greenlight_core::types::ApprovalOutcome;
use greenlight_core::waitloop::SystemClock;
use tracing::{debug, info};

/// Publish the marker comment and block until an authorized human
/// approves, rejects, or the deadline passes. Outputs are published even
/// for failing outcomes so downstream steps can see who rejected.
pub fn run(args: WaitArgs, json: bool) -> anyhow::Result<()> {
    let config = args.gate_config()?;
    let backend = args.context.backend()?;

    if args.context.run_id.is_some() {
        match backend.workflow_run_url() {
            Ok(url) => info!(url = %url, "gating workflow run"),
            Err(e) => debug!(error = %e, "could not resolve workflow run url"),
        }
    }

    let clock = SystemClock;
    let report = Orchestrator::new(&backend, &config, &clock).run(args.mode.into())?;

    output::publish_outputs(&report)?;
    output::emit_report(&report, json)?;

    match &report.outcome {
        ApprovalOutcome::Approved { .. } => Ok(()),
        ApprovalOutcome::Rejected { by } => Err(GateError::Rejected {
            by: by.login.clone(),
        }
        .into()),
        ApprovalOutcome::TimedOut => Err(GateError::Timeout {
            seconds: config.timeout_seconds,
        }
        .into()),
    }
}
