pub mod check;
pub mod wait;

use clap::{Args, ValueEnum};
use greenlight_core::config::GateConfig;
use greenlight_core::error::{GateError, Result};
use greenlight_core::github::{GithubBackend, RepoContext};
use greenlight_core::orchestrator::GateMode;
use greenlight_core::types::PermissionLevel;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Shared arguments
// ---------------------------------------------------------------------------

/// Repository/run coordinates and eligibility settings shared by every
/// subcommand. Values default from the CI environment where one exists.
#[derive(Debug, Args)]
pub struct ContextArgs {
    /// Repository in owner/name form
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repo: String,

    /// API token used for all backend calls
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Pull request number of the change under gate
    #[arg(long = "pull-request", env = "GREENLIGHT_PR_NUMBER")]
    pub pull_request: Option<u64>,

    /// Head commit sha the gate tracks
    #[arg(long, env = "GREENLIGHT_SHA")]
    pub sha: String,

    /// Workflow run id (for the run URL in log output)
    #[arg(long = "run-id", env = "GITHUB_RUN_ID")]
    pub run_id: Option<u64>,

    /// Gate configuration file (YAML); flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Allow commit authors/committers of the change to vote
    #[arg(long)]
    pub allow_authors: bool,

    /// Permission level whose holders may vote (repeatable; default write+admin)
    #[arg(long = "permission")]
    pub permissions: Vec<String>,
}

#[derive(Debug, Args)]
pub struct WaitArgs {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Signal channel to watch
    #[arg(long, value_enum, default_value_t = ModeArg::Reactions)]
    pub mode: ModeArg,

    /// Seconds between polls
    #[arg(long)]
    pub interval: Option<u64>,

    /// Overall deadline in seconds (0 = wait forever)
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Reactions on a commit comment
    Reactions,
    /// Reviews on the pull request
    Reviews,
}

impl From<ModeArg> for GateMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Reactions => GateMode::Reactions,
            ModeArg::Reviews => GateMode::Reviews,
        }
    }
}

// ---------------------------------------------------------------------------
// Config and backend construction
// ---------------------------------------------------------------------------

impl ContextArgs {
    /// Load the config file (or defaults) and fold the flag overrides in.
    pub fn gate_config(&self) -> Result<GateConfig> {
        let mut cfg = match &self.config {
            Some(path) => GateConfig::load(path)?,
            None => GateConfig::default(),
        };
        if self.allow_authors {
            cfg.authors_can_vote = true;
        }
        if !self.permissions.is_empty() {
            cfg.required_permissions = self
                .permissions
                .iter()
                .map(|p| p.parse::<PermissionLevel>())
                .collect::<Result<Vec<_>>>()?;
        }
        Ok(cfg)
    }

    pub fn backend(&self) -> Result<GithubBackend> {
        let (owner, repo) = RepoContext::parse_slug(&self.repo)?;
        if self.sha.is_empty() {
            return Err(GateError::Configuration(
                "a commit sha is required".to_string(),
            ));
        }
        let ctx = RepoContext {
            owner,
            repo,
            pull_number: self.pull_request,
            sha: self.sha.clone(),
            run_id: self.run_id,
        };
        GithubBackend::new(self.token.clone(), ctx)
    }
}

impl WaitArgs {
    pub fn gate_config(&self) -> Result<GateConfig> {
        let mut cfg = self.context.gate_config()?;
        if let Some(interval) = self.interval {
            cfg.poll_interval_seconds = interval;
        }
        if let Some(timeout) = self.timeout {
            cfg.timeout_seconds = timeout;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
