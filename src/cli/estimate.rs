//! Estimate command - show how much of a revision is still unpublished

use crate::cli::style::{check, cross, Stylize};
use anstream::println;
use chunk_push::checkpoint::CheckpointStore;
use chunk_push::config::ByteSize;
use chunk_push::error::Result;
use chunk_push::publish::estimate_size;
use chunk_push::repo::{GitRepo, GitStore};
use std::path::Path;

/// Run the estimate command
///
/// Read-only: the checkpoint store is opened in dry-run mode.
pub async fn run_estimate(
    path: &Path,
    rev: Option<&str>,
    budget: ByteSize,
    namespace: &str,
) -> Result<()> {
    let repo = GitRepo::open(path).await?;
    let rev = rev.unwrap_or("HEAD");
    let commit = repo.resolve_ref(rev).await?;

    let checkpoints = CheckpointStore::new(&repo, namespace, true);
    let frontier = checkpoints.frontier().await?;
    let size = estimate_size(&repo, &commit, &frontier).await?;

    println!(
        "{} ({}): {} unpublished ({size} bytes)",
        rev.accent(),
        commit.short().muted(),
        ByteSize(size).to_string().emphasis()
    );
    if !frontier.is_empty() {
        println!(
            "  {}",
            format!("excluding {} checkpoints", frontier.len()).muted()
        );
    }
    if size <= budget.bytes() {
        println!("{} fits in one push (budget {budget})", check());
    } else {
        println!(
            "{} needs chunking (budget {budget})",
            cross().for_stdout()
        );
    }
    Ok(())
}
