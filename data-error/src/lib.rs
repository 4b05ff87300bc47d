use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DonutError>;

/// Error taxonomy shared by all crates of the user-query service.
///
/// Storage and generator variants describe server-side failures;
/// the remaining variants describe bad client input and carry the
/// human-readable message that becomes the whole response body.
#[derive(Error, Debug)]
pub enum DonutError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("storage read failed: {0} {1}")]
    StorageRead(String, String),
    #[error("storage write failed: {0} {1}")]
    StorageWrite(String, String),
    #[error("missing required field: {0}")]
    MissingField(String),
    #[error("user {0} already exists")]
    DuplicateUser(String),
    #[error("no user found for {0}")]
    UserNotFound(String),
    #[error("friend-status filter needs a reference user")]
    MissingReferenceUser,
    #[error("artifact generator failed: {0}")]
    GeneratorFailure(String),
    #[error("refusing to generate an artifact from an empty result set")]
    EmptyResultSet,
    #[error("parsing error")]
    Parse,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DonutError {
    /// Whether this error is the caller's fault (4xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DonutError::MissingField(_)
                | DonutError::DuplicateUser(_)
                | DonutError::UserNotFound(_)
                | DonutError::MissingReferenceUser
        )
    }
}

impl From<serde_json::Error> for DonutError {
    fn from(_: serde_json::Error) -> Self {
        Self::Parse
    }
}
