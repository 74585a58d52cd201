use crate::cmd::ContextArgs;
use crate::output;
use greenlight_core::orchestrator::Orchestrator;
use greenlight_core::waitloop::SystemClock;

/// One-shot review check: succeed only if an eligible approval review
/// (or deploy-command review comment) already exists on the tracked sha.
pub fn run(args: ContextArgs, json: bool) -> anyhow::Result<()> {
    let config = args.gate_config()?;
    config.validate()?;
    let backend = args.backend()?;

    let clock = SystemClock;
    let report = Orchestrator::new(&backend, &config, &clock).check_once()?;

    output::publish_outputs(&report)?;
    output::emit_report(&report, json)?;
    Ok(())
}
