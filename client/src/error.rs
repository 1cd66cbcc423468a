//! Client-specific error types

use shared::{MemberId, SharedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response; `message` is the server's `error` field when present
    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("A quote run is already in progress for this session")]
    RunInFlight,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("No batch loaded; run quotes first")]
    NoBatch,

    #[error("Member {member_id} is not in the current batch")]
    UnknownMember { member_id: MemberId },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ClientError {
    /// Failures after which the run may still complete server-side
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(error) => error.is_timeout() || error.is_connect() || error.is_request(),
            ClientError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
