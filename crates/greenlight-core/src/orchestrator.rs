use crate::backend::Backend;
use crate::config::{GateConfig, REVIEW_COMMENT_MARKER};
use crate::eligibility::EligibilityFilter;
use crate::error::{GateError, Result};
use crate::reaction::ReactionStateMachine;
use crate::reconcile::{ArtifactReconciler, MatchMode};
use crate::types::{ApprovalOutcome, ApprovedVia, CommentId, CommentLocation, SignalSource};
use crate::waitloop::{Clock, WaitLoop};
use serde::Serialize;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// GateMode / RunReport
// ---------------------------------------------------------------------------

/// Which signal channel the gate watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Reactions on a commit comment (exact-match marker).
    Reactions,
    /// Reviews on the pull request (unique-marker issue comment).
    Reviews,
}

impl GateMode {
    fn comment_location(self) -> CommentLocation {
        match self {
            GateMode::Reactions => CommentLocation::Commit,
            GateMode::Reviews => CommentLocation::Issue,
        }
    }
}

/// Result of a gate run, with the named outputs the caller publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub outcome: ApprovalOutcome,
    pub comment_id: CommentId,
}

impl RunReport {
    /// Named output pairs: `comment-id` always, then `approved-by` (plus
    /// `review-id`/`review-type` for review-based approvals) or
    /// `rejected-by`. `review-type` is `approval` for an approval review
    /// and `comment` for a deploy-command review comment.
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![("comment-id", self.comment_id.to_string())];
        match &self.outcome {
            ApprovalOutcome::Approved { by, via, review_id } => {
                out.push(("approved-by", by.login.clone()));
                if let Some(review_id) = review_id {
                    out.push(("review-id", review_id.to_string()));
                    let kind = match via {
                        ApprovedVia::DeployCommand => "comment",
                        _ => "approval",
                    };
                    out.push(("review-type", kind.to_string()));
                }
            }
            ApprovalOutcome::Rejected { by } => {
                out.push(("rejected-by", by.login.clone()));
            }
            ApprovalOutcome::TimedOut => {}
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Composes the end-to-end gate: publish marker → mark waiting → wait for
/// a decision → mark the terminal state.
pub struct Orchestrator<'a> {
    backend: &'a dyn Backend,
    config: &'a GateConfig,
    clock: &'a dyn Clock,
}

impl<'a> Orchestrator<'a> {
    pub fn new(backend: &'a dyn Backend, config: &'a GateConfig, clock: &'a dyn Clock) -> Self {
        Self {
            backend,
            config,
            clock,
        }
    }

    /// Full polling gate. The terminal state reaction is written even when
    /// the wait reaction or the wait loop fails; a failure during that
    /// cleanup is logged and never masks the original outcome.
    pub fn run(&self, mode: GateMode) -> Result<RunReport> {
        let filter = EligibilityFilter::new(self.backend, self.config)?;
        let owner = filter.token_identity().id;

        let (body, match_mode) = self.marker_for(mode);
        let reconciler = ArtifactReconciler::new(self.backend, owner);
        let comment = reconciler.ensure_comment(mode.comment_location(), &body, &match_mode)?;

        let mut reactions =
            ReactionStateMachine::new(self.backend, owner, mode.comment_location());

        let source = match mode {
            GateMode::Reactions => SignalSource::Reactions {
                location: CommentLocation::Commit,
                comment_id: comment.id,
            },
            GateMode::Reviews => SignalSource::Reviews,
        };

        // Once the marker comment exists, every exit path must attempt a
        // terminal reaction, including a failure to set the wait state.
        let wait = WaitLoop::new(self.backend, &filter, self.config, self.clock);
        let result = reactions
            .set_state(comment.id, self.config.votes.wait)
            .and_then(|_| wait.run(source));

        let terminal = match &result {
            Ok(ApprovalOutcome::Approved { .. }) => self.config.votes.success,
            _ => self.config.votes.failed,
        };
        if let Err(cleanup) = reactions.set_state(comment.id, terminal) {
            warn!(
                comment_id = comment.id,
                error = %cleanup,
                "failed to set terminal state reaction"
            );
        }

        let outcome = result?;
        Ok(RunReport {
            outcome,
            comment_id: comment.id,
        })
    }

    /// Non-polling review check: reconcile the review-mode marker, run a
    /// single eligibility pass, and fail with `NoEligibleApproval` when
    /// nothing qualifies. No state reactions are set in this mode.
    pub fn check_once(&self) -> Result<RunReport> {
        let sha = self.backend.tracked_sha();
        info!(sha = %sha, "checking for approval reviews");

        let filter = EligibilityFilter::new(self.backend, self.config)?;
        let owner = filter.token_identity().id;

        let (body, match_mode) = self.marker_for(GateMode::Reviews);
        let reconciler = ArtifactReconciler::new(self.backend, owner);
        let comment = reconciler.ensure_comment(CommentLocation::Issue, &body, &match_mode)?;

        let wait = WaitLoop::new(self.backend, &filter, self.config, self.clock);
        match wait.poll_once(SignalSource::Reviews)? {
            Some(outcome @ ApprovalOutcome::Approved { .. }) => Ok(RunReport {
                outcome,
                comment_id: comment.id,
            }),
            Some(ApprovalOutcome::Rejected { by }) => Err(GateError::Rejected { by: by.login }),
            Some(ApprovalOutcome::TimedOut) | None => Err(GateError::NoEligibleApproval { sha }),
        }
    }

    fn marker_for(&self, mode: GateMode) -> (String, MatchMode) {
        match mode {
            GateMode::Reactions => (self.config.reaction_comment_body(), MatchMode::Exact),
            GateMode::Reviews => (
                self.config.review_comment_body(),
                MatchMode::Marker(REVIEW_COMMENT_MARKER.to_string()),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
