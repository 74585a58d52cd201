use crate::backend::Backend;
use crate::error::Result;
use crate::types::{ActorId, Artifact, CommentLocation};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// MatchMode
// ---------------------------------------------------------------------------

/// How a candidate comment's body is matched against the expected marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchMode {
    /// The body must equal the template byte-for-byte.
    Exact,
    /// The body must contain the unique marker substring. Used where the
    /// rendered body carries run-specific text around a stable first
    /// paragraph.
    Marker(String),
}

impl MatchMode {
    fn matches(&self, body: &str, expected: &str) -> bool {
        match self {
            MatchMode::Exact => body == expected,
            MatchMode::Marker(pattern) => body.contains(pattern.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// ArtifactReconciler
// ---------------------------------------------------------------------------

/// Finds-or-creates the marker comment idempotently.
///
/// A candidate is adopted only when it is "ours and unedited": authored by
/// the token identity, `created_at == updated_at`, and body matching per
/// [`MatchMode`]. Re-running the gate (job retry, second invocation) must
/// re-discover the existing marker rather than stack up duplicates.
pub struct ArtifactReconciler<'a> {
    backend: &'a dyn Backend,
    owner: ActorId,
}

impl<'a> ArtifactReconciler<'a> {
    pub fn new(backend: &'a dyn Backend, owner: ActorId) -> Self {
        Self { backend, owner }
    }

    pub fn ensure_comment(
        &self,
        location: CommentLocation,
        body: &str,
        mode: &MatchMode,
    ) -> Result<Artifact> {
        let candidates = self.backend.list_comments(location)?;
        let found = candidates
            .into_iter()
            .find(|c| c.is_unedited_by(self.owner) && mode.matches(&c.body, body));

        if let Some(comment) = found {
            info!(
                comment_id = comment.id,
                url = comment.url.as_deref().unwrap_or(""),
                "found existing marker comment"
            );
            return Ok(comment);
        }

        debug!("no matching marker comment found, creating one");
        let comment = self.backend.create_comment(location, body)?;
        info!(
            comment_id = comment.id,
            url = comment.url.as_deref().unwrap_or(""),
            "created marker comment"
        );
        Ok(comment)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
