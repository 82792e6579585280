//! Push-all command - publish every local branch

use crate::cli::progress::CliProgress;
use crate::cli::push::print_summary;
use crate::cli::style::Stylize;
use anstream::println;
use chunk_push::config::PublishConfig;
use chunk_push::error::Result;
use chunk_push::publish::{publish_all_branches, NoopProgress, ProgressCallback};
use chunk_push::repo::GitRepo;
use std::path::Path;

/// Run the push-all command
pub async fn run_push_all(path: &Path, config: PublishConfig, json: bool) -> Result<()> {
    let repo = GitRepo::open(path).await?;

    let progress: Box<dyn ProgressCallback> = if json {
        Box::new(NoopProgress)
    } else {
        Box::new(CliProgress::compact())
    };

    if !json && config.dry_run {
        println!("{}", "Dry run - no changes will be made".muted());
    }

    let reports = publish_all_branches(&repo, progress.as_ref(), &config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!();
    for report in &reports {
        print_summary(report);
    }
    Ok(())
}
