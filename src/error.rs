//! Error taxonomy shared by the planner, the API client and the orchestrator.

use std::path::PathBuf;

/// Errors produced while preparing or running an upload session.
///
/// Login and planning errors abort the run. `Transport` and
/// `FileUnreadable` are also used per file, where the orchestrator records
/// them in the report and moves on to the next task.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("login failed for user {username}: {status} {reason}")]
    AuthenticationFailed {
        username: String,
        status: u16,
        reason: String,
    },

    #[error("server returned a token that cannot be sent as a header")]
    InvalidToken,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("cannot read {}: {source}", .path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("source is neither a regular file nor a directory: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("failed to walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl UploadError {
    /// Report key used when this error ends a single upload task.
    pub fn report_key(&self) -> &'static str {
        match self {
            UploadError::FileUnreadable { .. } => "file unreadable",
            UploadError::Transport(_) => "transport error",
            _ => "error",
        }
    }
}
