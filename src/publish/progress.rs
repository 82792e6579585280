//! Progress callback trait for interface-agnostic updates
//!
//! This trait allows different interfaces (CLI, JSON report, tests) to
//! receive progress updates while a branch is being published.

use crate::error::Error;
use crate::publish::SizeCheck;
use crate::types::{CommitId, PushRequest};
use async_trait::async_trait;
use std::fmt;

/// Publish phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Estimating whether the whole branch fits in one transfer
    Estimating,
    /// Searching history for a transferable chunk
    Bisecting,
    /// Removing checkpoint markers
    CleaningUp,
    /// Publish complete
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Estimating => "Estimating push size",
            Self::Bisecting => "Splitting history",
            Self::CleaningUp => "Removing checkpoints",
            Self::Complete => "Done",
        })
    }
}

/// Transfer status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    /// Transfer started
    Started,
    /// Remote accepted the transfer
    Success,
    /// Dry run: transfer printed, not executed
    Simulated,
    /// Transfer rejected, will be retried as-is
    Retrying(String),
    /// Transfer rejected with git's diagnostic output
    Failed(String),
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => f.write_str("started"),
            Self::Success => f.write_str("pushed"),
            Self::Simulated => f.write_str("dry run"),
            Self::Retrying(msg) => write!(f, "rejected, retrying: {msg}"),
            Self::Failed(msg) => write!(f, "rejected: {msg}"),
        }
    }
}

/// Progress callback trait
///
/// Implement this trait to receive progress updates during publishing.
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called when entering a new phase
    async fn on_phase(&self, phase: Phase);

    /// Called when `push-all` moves on to the next branch
    async fn on_branch(&self, branch: &str, index: usize, total: usize);

    /// Called after every size estimate of a transfer candidate
    async fn on_size_check(&self, check: &SizeCheck);

    /// Called around every transfer (real or simulated)
    async fn on_transfer(&self, request: &PushRequest, status: TransferStatus);

    /// Called when a checkpoint marker was recorded
    async fn on_checkpoint(&self, commit: &CommitId);

    /// Called when an error occurs (non-fatal)
    async fn on_error(&self, error: &Error);

    /// Called with a general status message
    async fn on_message(&self, message: &str);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_phase(&self, _phase: Phase) {}
    async fn on_branch(&self, _branch: &str, _index: usize, _total: usize) {}
    async fn on_size_check(&self, _check: &SizeCheck) {}
    async fn on_transfer(&self, _request: &PushRequest, _status: TransferStatus) {}
    async fn on_checkpoint(&self, _commit: &CommitId) {}
    async fn on_error(&self, _error: &Error) {}
    async fn on_message(&self, _message: &str) {}
}
