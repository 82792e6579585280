//! Test data factories for histories, configs and progress recording
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use super::mock_store::MockGitStore;
use async_trait::async_trait;
use chunk_push::config::PublishConfig;
use chunk_push::error::Error;
use chunk_push::publish::{Phase, ProgressCallback, SizeCheck, TransferStatus};
use chunk_push::types::{CommitId, PushRequest};
use std::sync::Mutex;

pub const MB: u64 = 1_000_000;
pub const GB: u64 = 1_000_000_000;

/// Linear history on `main` with one blob of the given size per commit
///
/// Returns the store and the commits, oldest first.
pub fn linear_history(sizes: &[u64]) -> (MockGitStore, Vec<CommitId>) {
    let mut store = MockGitStore::new();
    let commits = extend_history(&mut store, None, sizes);
    if let Some(tip) = commits.last() {
        store.set_local_ref("refs/heads/main", tip);
    }
    (store, commits)
}

/// `n` commits of `size` bytes each on `main`
pub fn uniform_history(n: usize, size: u64) -> (MockGitStore, Vec<CommitId>) {
    linear_history(&vec![size; n])
}

/// Append a chain of sized commits on top of `parent`
pub fn extend_history(
    store: &mut MockGitStore,
    parent: Option<&CommitId>,
    sizes: &[u64],
) -> Vec<CommitId> {
    let mut commits: Vec<CommitId> = Vec::with_capacity(sizes.len());
    let mut parent = parent.cloned();
    for size in sizes {
        let commit = store.add_sized_commit(parent.as_ref(), *size);
        parent = Some(commit.clone());
        commits.push(commit);
    }
    commits
}

/// Config for `origin` with the given budget
pub fn make_config(budget: u64) -> PublishConfig {
    PublishConfig {
        budget,
        ..PublishConfig::default()
    }
}

/// Config for a dry run with the given budget
pub fn make_dry_run_config(budget: u64) -> PublishConfig {
    PublishConfig {
        dry_run: true,
        ..make_config(budget)
    }
}

/// Progress event captured by [`RecordingProgress`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Phase(Phase),
    Branch(String),
    SizeCheck(SizeCheck),
    Transfer(String, TransferStatus),
    Checkpoint(CommitId),
    Error(String),
    Message(String),
}

/// Progress callback that records every event in order
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<Event>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Destinations and statuses of all transfer events
    pub fn transfers(&self) -> Vec<(String, TransferStatus)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Transfer(dest, status) => Some((dest, status)),
                _ => None,
            })
            .collect()
    }

    pub fn checkpoints(&self) -> Vec<CommitId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Checkpoint(commit) => Some(commit),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ProgressCallback for RecordingProgress {
    async fn on_phase(&self, phase: Phase) {
        self.record(Event::Phase(phase));
    }

    async fn on_branch(&self, branch: &str, _index: usize, _total: usize) {
        self.record(Event::Branch(branch.to_string()));
    }

    async fn on_size_check(&self, check: &SizeCheck) {
        self.record(Event::SizeCheck(check.clone()));
    }

    async fn on_transfer(&self, request: &PushRequest, status: TransferStatus) {
        self.record(Event::Transfer(request.destination(), status));
    }

    async fn on_checkpoint(&self, commit: &CommitId) {
        self.record(Event::Checkpoint(commit.clone()));
    }

    async fn on_error(&self, error: &Error) {
        self.record(Event::Error(error.to_string()));
    }

    async fn on_message(&self, message: &str) {
        self.record(Event::Message(message.to_string()));
    }
}
