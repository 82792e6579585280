//! Checkpoint markers
//!
//! A checkpoint marker is a ref `<namespace>/<commit id>` recording that the
//! remote has acknowledged everything reachable from that commit. The set of
//! markers is the frontier every size estimate excludes. Markers are created
//! only after the remote accepted the corresponding transfer, and are removed
//! locally and remotely once the branch itself is published.

use crate::error::Result;
use crate::repo::GitStore;
use crate::types::{CommitId, PushRequest, RefEntry, RefSpec};
use tracing::debug;

/// Store for the checkpoint markers of one namespace
pub struct CheckpointStore<'a> {
    store: &'a dyn GitStore,
    namespace: String,
    dry_run: bool,
    /// Markers "created" during a dry run; never written as refs
    simulated: Vec<RefEntry>,
}

impl<'a> CheckpointStore<'a> {
    /// Markers under `namespace` (e.g. `refs/chunk-push`)
    ///
    /// In dry-run mode new markers are kept in memory only; existing refs
    /// are still read so a dry run sees a resumed frontier.
    pub fn new(store: &'a dyn GitStore, namespace: &str, dry_run: bool) -> Self {
        Self {
            store,
            namespace: namespace.trim_end_matches('/').to_string(),
            dry_run,
            simulated: Vec::new(),
        }
    }

    /// Namespace without trailing slash
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Ref name of the marker for `commit`
    pub fn marker_name(&self, commit: &CommitId) -> String {
        format!("{}/{commit}", self.namespace)
    }

    /// All current markers, sorted by name
    pub async fn list(&self) -> Result<Vec<RefEntry>> {
        let mut markers = self
            .store
            .list_refs(&format!("{}/", self.namespace))
            .await?;
        for marker in &self.simulated {
            if !markers.iter().any(|m| m.name == marker.name) {
                markers.push(marker.clone());
            }
        }
        markers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(markers)
    }

    /// Commits the markers point to
    pub async fn frontier(&self) -> Result<Vec<CommitId>> {
        Ok(self.list().await?.into_iter().map(|m| m.commit).collect())
    }

    /// Record that the remote holds everything reachable from `commit`
    pub async fn create(&mut self, commit: &CommitId) -> Result<()> {
        let name = self.marker_name(commit);
        if self.dry_run {
            debug!("Recording simulated checkpoint {name}");
            self.simulated.push(RefEntry {
                name,
                commit: commit.clone(),
            });
            return Ok(());
        }
        debug!("Creating checkpoint {name}");
        self.store.update_ref(&name, commit).await
    }

    /// Delete every local marker; returns how many were removed
    ///
    /// A dry run forgets its simulated markers and leaves real refs alone.
    pub async fn delete_local(&mut self) -> Result<usize> {
        if self.dry_run {
            let count = self.simulated.len();
            self.simulated.clear();
            return Ok(count);
        }

        let markers = self.list().await?;
        for marker in &markers {
            debug!("Deleting checkpoint {}", marker.name);
            self.store.delete_ref(&marker.name).await?;
        }
        Ok(markers.len())
    }

    /// Markers currently held by `remote`, sorted by name
    pub async fn remote_markers(&self, remote: &str) -> Result<Vec<RefEntry>> {
        self.store
            .list_remote_refs(remote, &format!("{}/", self.namespace))
            .await
    }

    /// Single transfer removing every remote marker absent locally
    ///
    /// Issue after [`Self::delete_local`] to clear the whole namespace on
    /// the remote.
    pub fn prune_request(&self, remote: &str) -> PushRequest {
        let pattern = format!("{}/*", self.namespace);
        PushRequest {
            remote: remote.to_string(),
            force: false,
            prune: true,
            refspecs: vec![RefSpec::update(pattern.clone(), pattern)],
        }
    }
}
