//! Publish every local branch

use crate::config::PublishConfig;
use crate::error::{Error, Result};
use crate::publish::{ChunkedPublisher, ProgressCallback, PublishReport};
use crate::repo::GitStore;
use tracing::info;

/// Publish each local branch in turn, chunking where needed
///
/// Branches are taken from `refs/heads/` in name order. The first fatal
/// error stops the loop; branches published before it stay published.
pub async fn publish_all_branches(
    store: &dyn GitStore,
    progress: &dyn ProgressCallback,
    config: &PublishConfig,
) -> Result<Vec<PublishReport>> {
    let branches = store.list_refs("refs/heads/").await?;
    if branches.is_empty() {
        return Err(Error::Precondition("no local branches to publish".to_string()));
    }
    info!("Publishing {} branches to {}", branches.len(), config.remote);

    let total = branches.len();
    let mut reports = Vec::with_capacity(total);
    for (index, entry) in branches.into_iter().enumerate() {
        let Some(name) = entry.branch_name() else {
            continue;
        };
        progress.on_branch(name, index, total).await;

        let publisher =
            ChunkedPublisher::new(store, progress, config.clone(), name, entry.commit.clone())
                .await?;
        reports.push(publisher.run().await?);
    }
    Ok(reports)
}
