use crate::error::{GateError, Result};
use crate::types::{PermissionLevel, ReactionContent};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// VoteVocabulary
// ---------------------------------------------------------------------------

/// The reactions the gate recognizes and the ones it sets itself.
///
/// `approve`/`reject` are read from humans; `wait`/`success`/`failed` are
/// written by the automation as its own state channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteVocabulary {
    #[serde(default = "default_approve")]
    pub approve: ReactionContent,
    #[serde(default = "default_reject")]
    pub reject: ReactionContent,
    #[serde(default = "default_wait")]
    pub wait: ReactionContent,
    #[serde(default = "default_success")]
    pub success: ReactionContent,
    #[serde(default = "default_failed")]
    pub failed: ReactionContent,
}

fn default_approve() -> ReactionContent {
    ReactionContent::PlusOne
}

fn default_reject() -> ReactionContent {
    ReactionContent::MinusOne
}

fn default_wait() -> ReactionContent {
    ReactionContent::Eyes
}

fn default_success() -> ReactionContent {
    ReactionContent::Rocket
}

fn default_failed() -> ReactionContent {
    ReactionContent::Confused
}

impl Default for VoteVocabulary {
    fn default() -> Self {
        Self {
            approve: default_approve(),
            reject: default_reject(),
            wait: default_wait(),
            success: default_success(),
            failed: default_failed(),
        }
    }
}

// ---------------------------------------------------------------------------
// GateConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Permission levels whose holders may vote.
    #[serde(default = "default_required_permissions")]
    pub required_permissions: Vec<PermissionLevel>,

    /// Whether commit authors/committers of the gated change may vote on it.
    #[serde(default)]
    pub authors_can_vote: bool,

    /// Seconds between polls of the signal source.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Wall-clock deadline for the wait loop. `0` means wait forever.
    #[serde(default)]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub votes: VoteVocabulary,

    /// First token of a review comment that counts as an approval.
    #[serde(default = "default_deploy_command")]
    pub deploy_command: String,
}

fn default_required_permissions() -> Vec<PermissionLevel> {
    vec![PermissionLevel::Write, PermissionLevel::Admin]
}

fn default_poll_interval() -> u64 {
    10
}

fn default_deploy_command() -> String {
    "/deploy".to_string()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            required_permissions: default_required_permissions(),
            authors_can_vote: false,
            poll_interval_seconds: default_poll_interval(),
            timeout_seconds: 0,
            votes: VoteVocabulary::default(),
            deploy_command: default_deploy_command(),
        }
    }
}

impl GateConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: GateConfig = serde_yaml::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_seconds == 0 {
            return Err(GateError::Configuration(
                "poll_interval_seconds must be greater than zero".to_string(),
            ));
        }
        if self.required_permissions.is_empty() {
            return Err(GateError::Configuration(
                "required_permissions must not be empty".to_string(),
            ));
        }
        if !self.deploy_command.starts_with('/') {
            return Err(GateError::Configuration(format!(
                "deploy command '{}' must start with '/'",
                self.deploy_command
            )));
        }
        if self.deploy_command.split_whitespace().count() != 1 {
            return Err(GateError::Configuration(format!(
                "deploy command '{}' must be a single token",
                self.deploy_command
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Marker comment templates
    // -----------------------------------------------------------------------

    /// Body of the marker comment in reaction mode. Also the exact-match
    /// reconciliation key, so the text must be deterministic.
    pub fn reaction_comment_body(&self) -> String {
        format!(
            "A repository maintainer needs to approve this workflow.\n\
             React with :{}: to approve or :{}: to reject.",
            self.votes.approve, self.votes.reject
        )
    }

    /// Body of the marker comment in review mode, paragraphs joined by
    /// blank lines the way the comment renders on the backend.
    pub fn review_comment_body(&self) -> String {
        let command_line = format!(
            "• **Submit a review comment** starting with `{}`",
            self.deploy_command
        );
        let paragraphs: [&str; 6] = [
            REVIEW_COMMENT_MARKER,
            "To approve, maintainers can either:",
            "• **Submit an approval review** on this pull request, OR",
            &command_line,
            "Then re-run the failed job(s) via the Checks tab above.",
            "Reviews must be on the specific commit SHA of the workflow run to be considered.",
        ];
        paragraphs.join("\n\n")
    }
}

/// Stable first paragraph of the review-mode comment, used as the
/// unique-marker substring during reconciliation.
pub const REVIEW_COMMENT_MARKER: &str =
    "A repository maintainer needs to approve these workflow run(s).";

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
