//! GitHub REST adapter for the [`Backend`] trait.
//!
//! Plain blocking HTTP; no retries here. Rate limiting and transient
//! failures surface as [`GateError::Backend`] and terminate the run.

use crate::backend::Backend;
use crate::error::{GateError, Result};
use crate::types::{
    Actor, ActorId, Artifact, ChangeCommit, CommentId, CommentLocation, PermissionLevel,
    ReactionContent, ReactionId, Signal, SignalSource,
};
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

// ---------------------------------------------------------------------------
// RepoContext
// ---------------------------------------------------------------------------

/// Repository and run coordinates, typically taken from the CI
/// environment (`GITHUB_REPOSITORY`, `GITHUB_RUN_ID`, the event payload).
#[derive(Debug, Clone)]
pub struct RepoContext {
    pub owner: String,
    pub repo: String,
    /// Pull request number; required for issue comments and reviews.
    pub pull_number: Option<u64>,
    /// The commit sha the gate tracks (head of the change under review).
    pub sha: String,
    /// Workflow run id; required only for the run URL lookup.
    pub run_id: Option<u64>,
}

impl RepoContext {
    /// Parse an `owner/name` slug as delivered by `GITHUB_REPOSITORY`.
    pub fn parse_slug(slug: &str) -> Result<(String, String)> {
        match slug.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
                Ok((owner.to_string(), repo.to_string()))
            }
            _ => Err(GateError::Configuration(format!(
                "repository slug '{slug}' is not of the form owner/name"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawUser {
    id: u64,
    login: String,
}

impl From<RawUser> for Actor {
    fn from(u: RawUser) -> Self {
        Actor {
            id: ActorId(u.id),
            login: u.login,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: Option<CommentId>,
    body: String,
    user: RawUser,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    html_url: Option<String>,
}

impl RawComment {
    fn into_artifact(self) -> Result<Artifact> {
        let id = match self.id {
            Some(id) if id != 0 => id,
            _ => return Err(GateError::CommentCreateFailed),
        };
        Ok(Artifact {
            id,
            body: self.body,
            author: self.user.into(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            url: self.html_url,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawReaction {
    id: Option<ReactionId>,
    content: String,
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    id: u64,
    state: crate::types::ReviewState,
    body: Option<String>,
    commit_id: String,
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawPermission {
    permission: String,
}

#[derive(Debug, Deserialize)]
struct RawCommitEntry {
    author: Option<RawUser>,
    committer: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawWorkflowRun {
    html_url: String,
}

// ---------------------------------------------------------------------------
// GithubBackend
// ---------------------------------------------------------------------------

pub struct GithubBackend {
    client: Client,
    api_base: String,
    token: String,
    ctx: RepoContext,
}

impl GithubBackend {
    pub fn new(token: impl Into<String>, ctx: RepoContext) -> Result<Self> {
        Self::with_base_url(token, ctx, DEFAULT_API_BASE)
    }

    /// Point the adapter at a non-default API host (GHES, test servers).
    pub fn with_base_url(
        token: impl Into<String>,
        ctx: RepoContext,
        api_base: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("greenlight/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            ctx,
        })
    }

    fn repo_path(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.ctx.owner, self.ctx.repo, tail
        )
    }

    fn pull_number(&self) -> Result<u64> {
        self.ctx.pull_number.ok_or_else(|| {
            GateError::Configuration(
                "a pull request number is required for this operation".to_string(),
            )
        })
    }

    fn check_status(url: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let excerpt: String = response
            .text()
            .unwrap_or_default()
            .chars()
            .take(200)
            .collect();
        Err(GateError::Backend(format!(
            "{url} returned {status}: {excerpt}"
        )))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()?;
        Ok(Self::check_status(url, response)?.json()?)
    }

    fn post_json<T: DeserializeOwned>(&self, url: &str, body: serde_json::Value) -> Result<T> {
        debug!(url, "POST");
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .json(&body)
            .send()?;
        Ok(Self::check_status(url, response)?.json()?)
    }

    fn delete(&self, url: &str) -> Result<()> {
        debug!(url, "DELETE");
        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()?;
        Self::check_status(url, response)?;
        Ok(())
    }

    fn comments_url(&self, location: CommentLocation) -> Result<String> {
        Ok(match location {
            CommentLocation::Commit => self.repo_path(&format!("commits/{}/comments", self.ctx.sha)),
            CommentLocation::Issue => {
                self.repo_path(&format!("issues/{}/comments", self.pull_number()?))
            }
        })
    }

    fn reactions_url(&self, location: CommentLocation, comment_id: CommentId) -> String {
        match location {
            CommentLocation::Commit => self.repo_path(&format!("comments/{comment_id}/reactions")),
            CommentLocation::Issue => {
                self.repo_path(&format!("issues/comments/{comment_id}/reactions"))
            }
        }
    }

    fn list_reaction_signals(
        &self,
        location: CommentLocation,
        comment_id: CommentId,
    ) -> Result<Vec<Signal>> {
        let raw: Vec<RawReaction> = self.get_json(&self.reactions_url(location, comment_id))?;
        Ok(raw
            .into_iter()
            .filter_map(|r| {
                let id = r.id?;
                let content = match ReactionContent::from_api(&r.content) {
                    Some(content) => content,
                    None => {
                        debug!(content = %r.content, "skipping unknown reaction content");
                        return None;
                    }
                };
                Some(Signal::Reaction {
                    id,
                    content,
                    actor: r.user.into(),
                })
            })
            .collect())
    }

    fn list_review_signals(&self) -> Result<Vec<Signal>> {
        let url = self.repo_path(&format!("pulls/{}/reviews", self.pull_number()?));
        let raw: Vec<RawReview> = self.get_json(&url)?;
        // Only reviews submitted against the tracked sha count; a review
        // of an older commit must not release the gate.
        Ok(raw
            .into_iter()
            .filter(|r| r.commit_id == self.ctx.sha)
            .map(|r| Signal::Review {
                id: r.id,
                state: r.state,
                body: r.body,
                commit_id: r.commit_id,
                actor: r.user.into(),
            })
            .collect())
    }
}

impl Backend for GithubBackend {
    fn authenticated_identity(&self) -> Result<Actor> {
        let user: RawUser = self.get_json(&format!("{}/user", self.api_base))?;
        Ok(user.into())
    }

    fn tracked_sha(&self) -> String {
        self.ctx.sha.clone()
    }

    fn list_change_commits(&self) -> Result<Vec<ChangeCommit>> {
        let url = self.repo_path(&format!("pulls/{}/commits", self.pull_number()?));
        let raw: Vec<RawCommitEntry> = self.get_json(&url)?;
        Ok(raw
            .into_iter()
            .map(|c| ChangeCommit {
                author: c.author.map(Into::into),
                committer: c.committer.map(Into::into),
            })
            .collect())
    }

    fn user_permission(&self, login: &str) -> Result<PermissionLevel> {
        let url = self.repo_path(&format!("collaborators/{login}/permission"));
        let raw: RawPermission = self.get_json(&url)?;
        Ok(PermissionLevel::from_api(&raw.permission))
    }

    fn list_comments(&self, location: CommentLocation) -> Result<Vec<Artifact>> {
        let raw: Vec<RawComment> = self.get_json(&self.comments_url(location)?)?;
        // Listings can in principle carry malformed entries; only a
        // missing id on *creation* is fatal, so skip them here.
        Ok(raw
            .into_iter()
            .filter_map(|c| c.into_artifact().ok())
            .collect())
    }

    fn create_comment(&self, location: CommentLocation, body: &str) -> Result<Artifact> {
        let raw: RawComment =
            self.post_json(&self.comments_url(location)?, json!({ "body": body }))?;
        raw.into_artifact()
    }

    fn list_signals(&self, source: SignalSource) -> Result<Vec<Signal>> {
        match source {
            SignalSource::Reactions {
                location,
                comment_id,
            } => self.list_reaction_signals(location, comment_id),
            SignalSource::Reviews => self.list_review_signals(),
        }
    }

    fn create_reaction(
        &self,
        location: CommentLocation,
        comment_id: CommentId,
        content: ReactionContent,
    ) -> Result<ReactionId> {
        let raw: RawReaction = self.post_json(
            &self.reactions_url(location, comment_id),
            json!({ "content": content.as_str() }),
        )?;
        raw.id
            .ok_or_else(|| GateError::ReactionCreateFailed(content.as_str().to_string()))
    }

    fn delete_reaction(
        &self,
        location: CommentLocation,
        comment_id: CommentId,
        reaction_id: ReactionId,
    ) -> Result<()> {
        let url = format!(
            "{}/{reaction_id}",
            self.reactions_url(location, comment_id)
        );
        self.delete(&url)
    }

    fn workflow_run_url(&self) -> Result<String> {
        let run_id = self.ctx.run_id.ok_or_else(|| {
            GateError::Configuration("no workflow run id found in context".to_string())
        })?;
        let url = self.repo_path(&format!("actions/runs/{run_id}"));
        let raw: RawWorkflowRun = self.get_json(&url)?;
        Ok(raw.html_url)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
