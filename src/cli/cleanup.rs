//! Cleanup command - remove leftover checkpoints

use crate::cli::style::{arrow, check, Stylize};
use anstream::println;
use chunk_push::checkpoint::CheckpointStore;
use chunk_push::config::PublishConfig;
use chunk_push::error::{Error, Result};
use chunk_push::repo::{GitRepo, GitStore};
use std::path::Path;

/// Run the cleanup command
///
/// Deletes every local checkpoint under `namespace`, then prunes the
/// namespace on the remote in one push when the remote still holds markers.
pub async fn run_cleanup(path: &Path, remote: &str, namespace: &str, dry_run: bool) -> Result<()> {
    PublishConfig {
        namespace: namespace.to_string(),
        ..PublishConfig::default()
    }
    .validate()?;

    let repo = GitRepo::open(path).await?;
    if !repo.remote_names().await?.iter().any(|r| r == remote) {
        return Err(Error::RemoteNotFound(remote.to_string()));
    }

    let mut checkpoints = CheckpointStore::new(&repo, namespace, dry_run);
    let markers = checkpoints.list().await?;
    let on_remote = checkpoints.remote_markers(remote).await?;
    if markers.is_empty() && on_remote.is_empty() {
        println!("{} Nothing to clean up", check());
        return Ok(());
    }
    let request = checkpoints.prune_request(remote);

    if dry_run {
        println!("{}", "Dry run - no changes will be made".muted());
        for marker in &markers {
            println!("  Would delete {}", marker.name.accent());
        }
        if !on_remote.is_empty() {
            println!("  {} Would run: {}", arrow(), request.to_string().accent());
        }
        return Ok(());
    }

    let removed = checkpoints.delete_local().await?;
    let plural = if removed == 1 { "" } else { "s" };
    if on_remote.is_empty() {
        println!("{} Removed {removed} local checkpoint{plural}", check());
        return Ok(());
    }

    repo.push(&request).await?;
    println!(
        "{} Removed {removed} local checkpoint{plural} and pruned {} on {}",
        check(),
        namespace.accent(),
        remote.accent()
    );
    Ok(())
}
