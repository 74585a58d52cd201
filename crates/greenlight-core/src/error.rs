use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to create marker comment: backend returned no identifier")]
    CommentCreateFailed,

    #[error("failed to create reaction with content :{0}:")]
    ReactionCreateFailed(String),

    #[error(
        "no eligible approval found for commit {sha}: reviews must be in the \
         APPROVED state or start with the deploy command, and come from users \
         with the required permissions"
    )]
    NoEligibleApproval { sha: String },

    #[error("workflow rejected by {by}")]
    Rejected { by: String },

    #[error("timed out after {seconds}s waiting for approval")]
    Timeout { seconds: u64 },

    #[error("backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GateError {
    fn from(e: reqwest::Error) -> Self {
        GateError::Backend(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
