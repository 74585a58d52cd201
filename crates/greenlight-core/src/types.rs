use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Opaque numeric user identifier. Identity comparisons always use this,
/// never the login; logins can be renamed or reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub login: String,
}

// ---------------------------------------------------------------------------
// PermissionLevel
// ---------------------------------------------------------------------------

/// Collaborator permission levels as reported by the backend.
///
/// Only membership in the configured allow-set matters; no ordering logic
/// is applied. Unknown strings map to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    None,
    Read,
    Triage,
    Write,
    Maintain,
    Admin,
}

impl PermissionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionLevel::None => "none",
            PermissionLevel::Read => "read",
            PermissionLevel::Triage => "triage",
            PermissionLevel::Write => "write",
            PermissionLevel::Maintain => "maintain",
            PermissionLevel::Admin => "admin",
        }
    }

    /// Lenient parse for API responses: anything unrecognized is `None`.
    pub fn from_api(s: &str) -> Self {
        match s {
            "read" => PermissionLevel::Read,
            "triage" => PermissionLevel::Triage,
            "write" => PermissionLevel::Write,
            "maintain" => PermissionLevel::Maintain,
            "admin" => PermissionLevel::Admin,
            _ => PermissionLevel::None,
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PermissionLevel {
    type Err = crate::error::GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(PermissionLevel::None),
            "read" => Ok(PermissionLevel::Read),
            "triage" => Ok(PermissionLevel::Triage),
            "write" => Ok(PermissionLevel::Write),
            "maintain" => Ok(PermissionLevel::Maintain),
            "admin" => Ok(PermissionLevel::Admin),
            _ => Err(crate::error::GateError::Configuration(format!(
                "unknown permission level '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ReactionContent
// ---------------------------------------------------------------------------

/// The fixed reaction vocabulary the backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionContent {
    #[serde(rename = "+1")]
    PlusOne,
    #[serde(rename = "-1")]
    MinusOne,
    #[serde(rename = "eyes")]
    Eyes,
    #[serde(rename = "rocket")]
    Rocket,
    #[serde(rename = "confused")]
    Confused,
    #[serde(rename = "laugh")]
    Laugh,
    #[serde(rename = "hooray")]
    Hooray,
    #[serde(rename = "heart")]
    Heart,
}

impl ReactionContent {
    /// Lenient parse for API responses; `None` for contents outside the
    /// known vocabulary.
    pub fn from_api(s: &str) -> Option<Self> {
        match s {
            "+1" => Some(ReactionContent::PlusOne),
            "-1" => Some(ReactionContent::MinusOne),
            "eyes" => Some(ReactionContent::Eyes),
            "rocket" => Some(ReactionContent::Rocket),
            "confused" => Some(ReactionContent::Confused),
            "laugh" => Some(ReactionContent::Laugh),
            "hooray" => Some(ReactionContent::Hooray),
            "heart" => Some(ReactionContent::Heart),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReactionContent::PlusOne => "+1",
            ReactionContent::MinusOne => "-1",
            ReactionContent::Eyes => "eyes",
            ReactionContent::Rocket => "rocket",
            ReactionContent::Confused => "confused",
            ReactionContent::Laugh => "laugh",
            ReactionContent::Hooray => "hooray",
            ReactionContent::Heart => "heart",
        }
    }
}

impl fmt::Display for ReactionContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReviewState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
    /// Catch-all for states this crate doesn't know; never actionable.
    #[serde(other)]
    Other,
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

pub type CommentId = u64;
pub type ReactionId = u64;

/// An observed approval signal: a reaction on the marker comment or a
/// review on the change under gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    Reaction {
        id: ReactionId,
        content: ReactionContent,
        actor: Actor,
    },
    Review {
        id: u64,
        state: ReviewState,
        body: Option<String>,
        commit_id: String,
        actor: Actor,
    },
}

impl Signal {
    pub fn actor(&self) -> &Actor {
        match self {
            Signal::Reaction { actor, .. } => actor,
            Signal::Review { actor, .. } => actor,
        }
    }

    /// Short human description for log lines.
    pub fn describe(&self) -> String {
        match self {
            Signal::Reaction { content, actor, .. } => {
                format!(":{}: by {}", content, actor.login)
            }
            Signal::Review { state, actor, .. } => {
                format!("{state:?} review by {}", actor.login)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// CommentLocation / SignalSource
// ---------------------------------------------------------------------------

/// Where marker comments live. The backend resolves the concrete
/// coordinates (tracked sha, pull request number) from its own context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentLocation {
    /// Comments attached to the tracked commit sha.
    Commit,
    /// Comments on the pull request conversation.
    Issue,
}

/// Location key for polling signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    /// Reactions on the marker comment. Commit comments and issue
    /// comments expose reactions through different backend endpoints, so
    /// the location travels with the comment id.
    Reactions {
        location: CommentLocation,
        comment_id: CommentId,
    },
    /// Reviews on the change, restricted to the tracked sha.
    Reviews,
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// The marker comment that carries the approval conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: CommentId,
    pub body: String,
    #[serde(rename = "user")]
    pub author: Actor,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Artifact {
    /// A comment is "ours and unedited" when the automation authored it and
    /// nobody (including a human with edit rights) has touched it since.
    pub fn is_unedited_by(&self, owner: ActorId) -> bool {
        self.author.id == owner && self.created_at == self.updated_at
    }
}

// ---------------------------------------------------------------------------
// ChangeCommit
// ---------------------------------------------------------------------------

/// One commit of the change under review. Either identity may be absent
/// (e.g. commits authored outside the platform).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCommit {
    pub author: Option<Actor>,
    pub committer: Option<Actor>,
}

// ---------------------------------------------------------------------------
// ApprovalOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovedVia {
    Reaction,
    Review,
    DeployCommand,
}

impl ApprovedVia {
    pub fn as_str(self) -> &'static str {
        match self {
            ApprovedVia::Reaction => "reaction",
            ApprovedVia::Review => "review",
            ApprovedVia::DeployCommand => "deploy-command",
        }
    }
}

impl fmt::Display for ApprovedVia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a gate run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Approved {
        by: Actor,
        via: ApprovedVia,
        /// Present when the approval came from a review or review comment.
        review_id: Option<u64>,
    },
    Rejected {
        by: Actor,
    },
    TimedOut,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
