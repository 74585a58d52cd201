//! In-memory fakes shared by the engine's unit tests.

use crate::backend::Backend;
use crate::error::{GateError, Result};
use crate::types::{
    Actor, ActorId, Artifact, ChangeCommit, CommentId, CommentLocation, PermissionLevel,
    ReactionContent, ReactionId, Signal, SignalSource,
};
use crate::waitloop::Clock;
use chrono::{DateTime, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

pub fn actor(id: u64, login: &str) -> Actor {
    Actor {
        id: ActorId(id),
        login: login.to_string(),
    }
}

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// FakeBackend
// ---------------------------------------------------------------------------

/// Scriptable in-memory [`Backend`]. The token user is id 1 / `gate-bot`
/// and the tracked sha is `abc123`.
///
/// `list_signals` serves scripted polls first (one per call, via
/// [`push_poll`](Self::push_poll)); once the script is exhausted it falls
/// back to the live reaction store.
pub struct FakeBackend {
    token_user: Actor,
    commits: RefCell<Vec<ChangeCommit>>,
    permissions: RefCell<HashMap<String, PermissionLevel>>,
    commit_comments: RefCell<Vec<Artifact>>,
    issue_comments: RefCell<Vec<Artifact>>,
    reactions: RefCell<Vec<(CommentId, ReactionId, ReactionContent, Actor)>>,
    poll_script: RefCell<VecDeque<Vec<Signal>>>,
    next_id: Cell<u64>,
    create_comment_calls: Cell<usize>,
    signal_polls: Cell<usize>,
    list_signals_error: RefCell<Option<String>>,
    list_signals_fail_on: Cell<Option<usize>>,
    create_reaction_error: RefCell<Option<String>>,
    create_reaction_allow: Cell<Option<usize>>,
    create_reaction_calls: Cell<usize>,
    create_reaction_fail_on: Cell<Option<usize>>,
    create_comment_without_id: Cell<bool>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            token_user: actor(1, "gate-bot"),
            commits: RefCell::new(Vec::new()),
            permissions: RefCell::new(HashMap::new()),
            commit_comments: RefCell::new(Vec::new()),
            issue_comments: RefCell::new(Vec::new()),
            reactions: RefCell::new(Vec::new()),
            poll_script: RefCell::new(VecDeque::new()),
            next_id: Cell::new(100),
            create_comment_calls: Cell::new(0),
            signal_polls: Cell::new(0),
            list_signals_error: RefCell::new(None),
            list_signals_fail_on: Cell::new(None),
            create_reaction_error: RefCell::new(None),
            create_reaction_allow: Cell::new(None),
            create_reaction_calls: Cell::new(0),
            create_reaction_fail_on: Cell::new(None),
            create_comment_without_id: Cell::new(false),
        }
    }

    pub fn token_user(&self) -> Actor {
        self.token_user.clone()
    }

    fn fresh_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    // -- scripting ---------------------------------------------------------

    pub fn set_permission(&self, login: &str, level: PermissionLevel) {
        self.permissions
            .borrow_mut()
            .insert(login.to_string(), level);
    }

    pub fn add_commit(&self, author: Option<Actor>, committer: Option<Actor>) {
        self.commits
            .borrow_mut()
            .push(ChangeCommit { author, committer });
    }

    /// Seed an existing comment. `edited` comments get a later
    /// `updated_at` so they fail the unedited check.
    pub fn seed_comment(&self, location: CommentLocation, author: Actor, body: &str, edited: bool) -> CommentId {
        let id = self.fresh_id();
        let created = fixed_time();
        let updated = if edited {
            created + chrono::Duration::seconds(60)
        } else {
            created
        };
        let comment = Artifact {
            id,
            body: body.to_string(),
            author,
            created_at: created,
            updated_at: updated,
            url: Some(format!("https://example.test/comments/{id}")),
        };
        match location {
            CommentLocation::Commit => self.commit_comments.borrow_mut().push(comment),
            CommentLocation::Issue => self.issue_comments.borrow_mut().push(comment),
        }
        id
    }

    /// Place a human reaction on a comment, bypassing `create_reaction`.
    pub fn seed_reaction(&self, comment_id: CommentId, content: ReactionContent, by: Actor) -> ReactionId {
        let id = self.fresh_id();
        self.reactions
            .borrow_mut()
            .push((comment_id, id, content, by));
        id
    }

    /// Queue the result of the next `list_signals` call.
    pub fn push_poll(&self, signals: Vec<Signal>) {
        self.poll_script.borrow_mut().push_back(signals);
    }

    pub fn fail_list_signals(&self, message: &str) {
        *self.list_signals_error.borrow_mut() = Some(message.to_string());
    }

    pub fn fail_create_reaction(&self, message: &str) {
        *self.create_reaction_error.borrow_mut() = Some(message.to_string());
    }

    pub fn fail_create_reaction_clear(&self) {
        *self.create_reaction_error.borrow_mut() = None;
    }

    /// Fail exactly the `n`th `list_signals` call (1-indexed).
    pub fn fail_list_signals_on_call(&self, n: usize) {
        self.list_signals_fail_on.set(Some(n));
    }

    /// Let the first `n` `create_reaction` calls succeed, fail the rest.
    pub fn fail_create_reaction_after(&self, n: usize) {
        self.create_reaction_allow.set(Some(n));
    }

    /// Fail exactly the `n`th `create_reaction` call (1-indexed).
    pub fn fail_create_reaction_on_call(&self, n: usize) {
        self.create_reaction_fail_on.set(Some(n));
    }

    pub fn refuse_comment_ids(&self) {
        self.create_comment_without_id.set(true);
    }

    // -- inspection --------------------------------------------------------

    pub fn signal_polls(&self) -> usize {
        self.signal_polls.get()
    }

    pub fn create_comment_calls(&self) -> usize {
        self.create_comment_calls.get()
    }

    pub fn comment_count(&self, location: CommentLocation) -> usize {
        match location {
            CommentLocation::Commit => self.commit_comments.borrow().len(),
            CommentLocation::Issue => self.issue_comments.borrow().len(),
        }
    }

    /// Reactions on a comment as `(reaction_id, content, actor_id)`.
    pub fn reactions_on(&self, comment_id: CommentId) -> Vec<(ReactionId, ReactionContent, ActorId)> {
        self.reactions
            .borrow()
            .iter()
            .filter(|(c, ..)| *c == comment_id)
            .map(|(_, id, content, by)| (*id, *content, by.id))
            .collect()
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for FakeBackend {
    fn authenticated_identity(&self) -> Result<Actor> {
        Ok(self.token_user.clone())
    }

    fn tracked_sha(&self) -> String {
        "abc123".to_string()
    }

    fn list_change_commits(&self) -> Result<Vec<ChangeCommit>> {
        Ok(self.commits.borrow().clone())
    }

    fn user_permission(&self, login: &str) -> Result<PermissionLevel> {
        Ok(self
            .permissions
            .borrow()
            .get(login)
            .copied()
            .unwrap_or(PermissionLevel::None))
    }

    fn list_comments(&self, location: CommentLocation) -> Result<Vec<Artifact>> {
        Ok(match location {
            CommentLocation::Commit => self.commit_comments.borrow().clone(),
            CommentLocation::Issue => self.issue_comments.borrow().clone(),
        })
    }

    fn create_comment(&self, location: CommentLocation, body: &str) -> Result<Artifact> {
        self.create_comment_calls
            .set(self.create_comment_calls.get() + 1);
        if self.create_comment_without_id.get() {
            return Err(GateError::CommentCreateFailed);
        }
        let id = self.seed_comment(location, self.token_user.clone(), body, false);
        let comments = self.list_comments(location)?;
        Ok(comments.into_iter().find(|c| c.id == id).unwrap())
    }

    fn list_signals(&self, source: SignalSource) -> Result<Vec<Signal>> {
        self.signal_polls.set(self.signal_polls.get() + 1);
        if let Some(message) = self.list_signals_error.borrow().as_ref() {
            return Err(GateError::Backend(message.clone()));
        }
        if self.list_signals_fail_on.get() == Some(self.signal_polls.get()) {
            return Err(GateError::Backend("injected list_signals failure".to_string()));
        }
        if let Some(scripted) = self.poll_script.borrow_mut().pop_front() {
            return Ok(scripted);
        }
        match source {
            SignalSource::Reactions { comment_id, .. } => Ok(self
                .reactions
                .borrow()
                .iter()
                .filter(|(c, ..)| *c == comment_id)
                .map(|(_, id, content, by)| Signal::Reaction {
                    id: *id,
                    content: *content,
                    actor: by.clone(),
                })
                .collect()),
            SignalSource::Reviews => Ok(Vec::new()),
        }
    }

    fn create_reaction(
        &self,
        _location: CommentLocation,
        comment_id: CommentId,
        content: ReactionContent,
    ) -> Result<ReactionId> {
        self.create_reaction_calls
            .set(self.create_reaction_calls.get() + 1);
        if self.create_reaction_fail_on.get() == Some(self.create_reaction_calls.get()) {
            return Err(GateError::Backend(
                "injected create_reaction failure".to_string(),
            ));
        }
        if let Some(message) = self.create_reaction_error.borrow().as_ref() {
            return Err(GateError::Backend(message.clone()));
        }
        if let Some(allowed) = self.create_reaction_allow.get() {
            if allowed == 0 {
                return Err(GateError::Backend("injected create_reaction failure".to_string()));
            }
            self.create_reaction_allow.set(Some(allowed - 1));
        }
        Ok(self.seed_reaction(comment_id, content, self.token_user.clone()))
    }

    fn delete_reaction(
        &self,
        _location: CommentLocation,
        comment_id: CommentId,
        reaction_id: ReactionId,
    ) -> Result<()> {
        self.reactions
            .borrow_mut()
            .retain(|(c, id, ..)| !(*c == comment_id && *id == reaction_id));
        Ok(())
    }

    fn workflow_run_url(&self) -> Result<String> {
        Ok("https://example.test/runs/1".to_string())
    }
}

// ---------------------------------------------------------------------------
// FakeClock
// ---------------------------------------------------------------------------

/// Deterministic [`Clock`]: time advances only when the loop sleeps.
pub struct FakeClock {
    base: Instant,
    elapsed: Cell<Duration>,
    sleeps: Cell<usize>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
            sleeps: Cell::new(0),
        }
    }

    pub fn sleeps(&self) -> usize {
        self.sleeps.get()
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.elapsed.set(self.elapsed.get() + duration);
    }
}
