//! Size estimation against the checkpoint frontier

use crate::error::Result;
use crate::repo::GitStore;
use crate::types::CommitId;
use tracing::debug;

/// Outcome of comparing a candidate's estimated size with the budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeCheck {
    /// Candidate commit
    pub commit: CommitId,
    /// Estimated on-disk size of its unpublished objects
    pub size: u64,
    /// Budget it was checked against
    pub budget: u64,
}

impl SizeCheck {
    /// Whether a transfer of this candidate stays within the budget
    pub const fn fits(&self) -> bool {
        self.size <= self.budget
    }
}

/// Sum of the on-disk sizes of all objects reachable from `commit` but not
/// from any commit in `frontier`
///
/// Read-only; touches only local storage.
pub async fn estimate_size(
    store: &dyn GitStore,
    commit: &CommitId,
    frontier: &[CommitId],
) -> Result<u64> {
    let objects = store.reachable_objects(commit, frontier).await?;
    let sizes = store.object_disk_sizes(&objects).await?;
    let total = sizes.iter().sum();
    debug!(
        "Estimated {} objects reachable from {} (excluding {} checkpoints): {total} bytes",
        objects.len(),
        commit.short(),
        frontier.len()
    );
    Ok(total)
}
