//! Git repository access
//!
//! The publisher talks to git only through the [`GitStore`] trait, so tests
//! can substitute an in-memory history.

mod git;

pub use git::GitRepo;

use crate::error::Result;
use crate::types::{CommitId, ObjectId, PushRequest, RefEntry};
use async_trait::async_trait;

/// Operations the publisher needs from a git repository and its remotes
#[async_trait]
pub trait GitStore: Send + Sync {
    /// Resolve a revision (ref name, abbreviated or full ID) to a commit
    async fn resolve_ref(&self, name: &str) -> Result<CommitId>;

    /// Name of the checked-out branch; fails on a detached HEAD
    async fn current_branch(&self) -> Result<String>;

    /// Configured remote names
    async fn remote_names(&self) -> Result<Vec<String>>;

    /// Refs whose full name starts with `prefix`, sorted by name
    async fn list_refs(&self, prefix: &str) -> Result<Vec<RefEntry>>;

    /// Refs on `remote` whose full name starts with `prefix`, sorted by name
    async fn list_remote_refs(&self, remote: &str, prefix: &str) -> Result<Vec<RefEntry>>;

    /// Commits reachable from `tip` but not from any of `excluding`,
    /// in topological order with the oldest first and `tip` last
    async fn commits_between(&self, tip: &CommitId, excluding: &[CommitId])
    -> Result<Vec<CommitId>>;

    /// All objects reachable from `tip` but not from any of `excluding`
    async fn reachable_objects(
        &self,
        tip: &CommitId,
        excluding: &[CommitId],
    ) -> Result<Vec<ObjectId>>;

    /// On-disk size of each object, in the order given
    async fn object_disk_sizes(&self, objects: &[ObjectId]) -> Result<Vec<u64>>;

    /// Create or move a local ref
    async fn update_ref(&self, name: &str, commit: &CommitId) -> Result<()>;

    /// Delete a local ref
    async fn delete_ref(&self, name: &str) -> Result<()>;

    /// Transfer a ref update to a remote
    ///
    /// A refusal by the remote (or any transport failure) is reported as
    /// [`crate::error::Error::TransferRejected`].
    async fn push(&self, request: &PushRequest) -> Result<()>;
}
