use crate::backend::Backend;
use crate::error::Result;
use crate::types::{ActorId, CommentId, CommentLocation, ReactionContent, Signal, SignalSource};
use tracing::debug;

// ---------------------------------------------------------------------------
// ReactionStateMachine
// ---------------------------------------------------------------------------

/// Maintains the automation's own reaction channel on the marker comment.
///
/// The invariant: after any `set_state` call, at most one reaction by the
/// owning actor is present on the comment. Achieved by remove-then-add;
/// best-effort against concurrent external mutation, which this process
/// never performs itself.
pub struct ReactionStateMachine<'a> {
    backend: &'a dyn Backend,
    owner: ActorId,
    location: CommentLocation,
    /// Last state this instance set, per comment. Skipping a redundant
    /// call is purely an optimization; correctness holds without it.
    last_set: Option<(CommentId, ReactionContent)>,
}

impl<'a> ReactionStateMachine<'a> {
    pub fn new(backend: &'a dyn Backend, owner: ActorId, location: CommentLocation) -> Self {
        Self {
            backend,
            owner,
            location,
            last_set: None,
        }
    }

    /// Replace every reaction by the owning actor on the comment with a
    /// single reaction carrying `content`.
    pub fn set_state(&mut self, comment_id: CommentId, content: ReactionContent) -> Result<()> {
        if self.last_set == Some((comment_id, content)) {
            debug!(comment_id, content = %content, "state reaction already set, skipping");
            return Ok(());
        }

        self.remove_own_reactions(comment_id)?;
        self.backend
            .create_reaction(self.location, comment_id, content)?;
        self.last_set = Some((comment_id, content));
        debug!(comment_id, content = %content, "state reaction set");
        Ok(())
    }

    fn remove_own_reactions(&mut self, comment_id: CommentId) -> Result<()> {
        // Any failure below leaves the remote state unknown; drop the
        // cache so the next call starts from scratch.
        self.last_set = None;

        let signals = self.backend.list_signals(SignalSource::Reactions {
            location: self.location,
            comment_id,
        })?;
        for signal in signals {
            if let Signal::Reaction { id, actor, .. } = signal {
                if actor.id == self.owner {
                    self.backend.delete_reaction(self.location, comment_id, id)?;
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
