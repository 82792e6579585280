//! Error types for git-chunk-push

use crate::types::CommitId;
use thiserror::Error;

/// Errors that abort a publish run
///
/// Recoverable outcomes (an over-budget estimate, a rejected transfer) are
/// not errors; see [`crate::publish::PublishAttempt`].
#[derive(Error, Debug)]
pub enum Error {
    /// A git command exited with a non-zero status
    #[error("git command failed: {0}")]
    Git(String),

    /// The path is not inside a git work tree
    #[error("not a git repository: {0}")]
    NotARepository(String),

    /// A precondition for publishing does not hold
    #[error("{0}")]
    Precondition(String),

    /// A reference could not be resolved to a commit
    #[error("reference not found: {0}")]
    RefNotFound(String),

    /// The named remote is not configured
    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    /// The remote refused a transfer
    #[error("transfer to {dest} rejected: {message}")]
    TransferRejected {
        /// Destination ref of the refused transfer
        dest: String,
        /// Diagnostic output from git
        message: String,
    },

    /// A single commit's objects exceed the budget on their own
    #[error(
        "cannot reduce push size further: commit {commit} alone is {size} bytes \
         (budget {budget} bytes)"
    )]
    Unreducible {
        /// The commit that cannot be split
        commit: CommitId,
        /// Its estimated unpublished size
        size: u64,
        /// The configured budget
        budget: u64,
    },

    /// A size value could not be parsed
    #[error("invalid size: {0}")]
    InvalidSize(String),

    /// A checkpoint namespace is not usable as a ref prefix
    #[error("invalid checkpoint namespace: {0}")]
    InvalidNamespace(String),

    /// Unexpected git output
    #[error("parse error: {0}")]
    Parse(String),

    /// I/O error while talking to a git process
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failed
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for git-chunk-push
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error is the bisection giving up on a single commit
    pub const fn is_unreducible(&self) -> bool {
        matches!(self, Self::Unreducible { .. })
    }
}
