use crate::error::Result;
use crate::types::{
    Actor, Artifact, ChangeCommit, CommentId, CommentLocation, PermissionLevel, ReactionContent,
    ReactionId, Signal, SignalSource,
};

/// Capability set the approval engine needs from the hosting platform.
///
/// The engine never talks to the platform directly; everything flows
/// through this trait so the resolution logic can be exercised against an
/// in-memory fake. [`crate::github::GithubBackend`] is the production
/// implementation.
///
/// Errors surface as [`crate::GateError::Backend`] and are not retried
/// here; retry policy belongs to the implementation.
pub trait Backend {
    /// The automation's own identity (the token user).
    fn authenticated_identity(&self) -> Result<Actor>;

    /// The commit sha the gate is tracking.
    fn tracked_sha(&self) -> String;

    /// All commits of the change under gate, author/committer included.
    fn list_change_commits(&self) -> Result<Vec<ChangeCommit>>;

    /// Collaborator permission level for a login.
    fn user_permission(&self, login: &str) -> Result<PermissionLevel>;

    /// Candidate marker comments at the location, in backend order.
    fn list_comments(&self, location: CommentLocation) -> Result<Vec<Artifact>>;

    /// Create a marker comment at the location. Must fail when the backend
    /// returns no identifier.
    fn create_comment(&self, location: CommentLocation, body: &str) -> Result<Artifact>;

    /// Current signals at the source, in backend order (typically
    /// most-recent-first for reviews). For [`SignalSource::Reviews`] the
    /// returned reviews are already restricted to the tracked sha.
    fn list_signals(&self, source: SignalSource) -> Result<Vec<Signal>>;

    fn create_reaction(
        &self,
        location: CommentLocation,
        comment_id: CommentId,
        content: ReactionContent,
    ) -> Result<ReactionId>;

    fn delete_reaction(
        &self,
        location: CommentLocation,
        comment_id: CommentId,
        reaction_id: ReactionId,
    ) -> Result<()>;

    /// Browser URL of the workflow run that invoked the gate.
    fn workflow_run_url(&self) -> Result<String>;
}
