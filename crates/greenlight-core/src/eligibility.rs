use crate::backend::Backend;
use crate::config::GateConfig;
use crate::error::Result;
use crate::types::{Actor, ActorId, ReviewState, Signal};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

// ---------------------------------------------------------------------------
// EligibilityDecision
// ---------------------------------------------------------------------------

/// Why a signal was accepted as a vote or excluded from consideration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityReason {
    AcceptedApproval,
    AcceptedRejection,
    AcceptedDeployCommand,
    ExcludedAuthor,
    ExcludedTokenIdentity,
    ExcludedPermission,
    ExcludedNotActionable,
}

impl EligibilityReason {
    pub fn accepted(self) -> bool {
        matches!(
            self,
            EligibilityReason::AcceptedApproval
                | EligibilityReason::AcceptedRejection
                | EligibilityReason::AcceptedDeployCommand
        )
    }
}

#[derive(Debug, Clone)]
pub struct EligibilityDecision {
    pub signal: Signal,
    pub reason: EligibilityReason,
}

impl EligibilityDecision {
    pub fn accepted(&self) -> bool {
        self.reason.accepted()
    }
}

// ---------------------------------------------------------------------------
// EligibilityFilter
// ---------------------------------------------------------------------------

/// Decides which observed signals count as approval or rejection votes.
///
/// The exclusion order is a contract, checked in sequence with the first
/// match winning: commit authors (unless allowed), the automation's own
/// identity (its "waiting" reaction must never count as a vote), then the
/// permission allow-list, and finally content classification.
pub struct EligibilityFilter<'a> {
    backend: &'a dyn Backend,
    config: &'a GateConfig,
    token_identity: Actor,
    authors: HashSet<ActorId>,
}

impl<'a> EligibilityFilter<'a> {
    /// Resolves the token identity and the change's author set up front;
    /// both are stable for the lifetime of a run.
    ///
    /// The author set is not re-fetched between polls, so a commit pushed
    /// mid-wait does not add its author to the exclusion set. The gate
    /// tracks a fixed sha, and such a push invalidates the run anyway.
    pub fn new(backend: &'a dyn Backend, config: &'a GateConfig) -> Result<Self> {
        let token_identity = backend.authenticated_identity()?;
        let authors = resolve_author_set(backend)?;
        Ok(Self {
            backend,
            config,
            token_identity,
            authors,
        })
    }

    pub fn token_identity(&self) -> &Actor {
        &self.token_identity
    }

    pub fn classify(&self, signal: &Signal) -> Result<EligibilityDecision> {
        let reason = self.classify_reason(signal)?;
        if reason.accepted() {
            debug!(signal = %signal.describe(), ?reason, "signal accepted");
        } else {
            debug!(signal = %signal.describe(), ?reason, "signal excluded");
        }
        Ok(EligibilityDecision {
            signal: signal.clone(),
            reason,
        })
    }

    fn classify_reason(&self, signal: &Signal) -> Result<EligibilityReason> {
        let actor = signal.actor();

        if !self.config.authors_can_vote && self.authors.contains(&actor.id) {
            return Ok(EligibilityReason::ExcludedAuthor);
        }

        if actor.id == self.token_identity.id {
            return Ok(EligibilityReason::ExcludedTokenIdentity);
        }

        let permission = self.backend.user_permission(&actor.login)?;
        if !self.config.required_permissions.contains(&permission) {
            return Ok(EligibilityReason::ExcludedPermission);
        }

        Ok(self.classify_content(signal))
    }

    fn classify_content(&self, signal: &Signal) -> EligibilityReason {
        match signal {
            Signal::Reaction { content, .. } => {
                if *content == self.config.votes.reject {
                    EligibilityReason::AcceptedRejection
                } else if *content == self.config.votes.approve {
                    EligibilityReason::AcceptedApproval
                } else {
                    EligibilityReason::ExcludedNotActionable
                }
            }
            Signal::Review { state, body, .. } => {
                if *state == ReviewState::Approved {
                    EligibilityReason::AcceptedApproval
                } else if body
                    .as_deref()
                    .is_some_and(|b| is_deploy_command(b, &self.config.deploy_command))
                {
                    EligibilityReason::AcceptedDeployCommand
                } else {
                    EligibilityReason::ExcludedNotActionable
                }
            }
        }
    }
}

/// True when the trimmed body's first whitespace-delimited token equals the
/// command, case-insensitively. The command anywhere else in the text does
/// not qualify.
pub fn is_deploy_command(body: &str, command: &str) -> bool {
    body.trim()
        .split_whitespace()
        .next()
        .is_some_and(|token| token.eq_ignore_ascii_case(command))
}

/// Union of author and committer identities over every commit of the
/// change under gate, deduplicated; commits lacking either are skipped.
pub fn resolve_author_set(backend: &dyn Backend) -> Result<HashSet<ActorId>> {
    let commits = backend.list_change_commits()?;
    let mut authors = HashSet::new();
    for commit in commits {
        if let Some(author) = commit.author {
            authors.insert(author.id);
        }
        if let Some(committer) = commit.committer {
            authors.insert(committer.id);
        }
    }
    Ok(authors)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
