//! Push command - publish one branch in size-bounded chunks

use crate::cli::progress::CliProgress;
use crate::cli::style::{check, Stylize};
use anstream::println;
use chunk_push::config::{ByteSize, PublishConfig};
use chunk_push::error::Result;
use chunk_push::publish::{ChunkedPublisher, NoopProgress, ProgressCallback, PublishReport};
use chunk_push::repo::GitRepo;
use std::path::Path;

/// Run the push command (default when no subcommand given)
pub async fn run_push(
    path: &Path,
    config: PublishConfig,
    branch: Option<&str>,
    rev: Option<&str>,
    json: bool,
) -> Result<()> {
    let repo = GitRepo::open(path).await?;

    let progress: Box<dyn ProgressCallback> = if json {
        Box::new(NoopProgress)
    } else {
        Box::new(CliProgress::verbose())
    };

    let publisher =
        ChunkedPublisher::for_branch(&repo, progress.as_ref(), config.clone(), branch, rev)
            .await?;

    if !json {
        println!(
            "Publishing {} ({}) to {} in chunks of at most {}",
            publisher.branch().accent(),
            publisher.target().short().muted(),
            config.remote.accent(),
            ByteSize(config.budget).to_string().emphasis()
        );
        if config.dry_run {
            println!("{}", "Dry run - no changes will be made".muted());
        }
        println!();
    }

    let report = publisher.run().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        print_summary(&report);
    }

    Ok(())
}

/// One-line outcome of a publish
pub fn print_summary(report: &PublishReport) {
    let chunks = report.chunks.len();
    let chunk_note = match chunks {
        0 => "in a single push".to_string(),
        1 => "after 1 chunk".to_string(),
        n => format!("after {n} chunks"),
    };

    if report.dry_run {
        println!(
            "{} Dry run: {} would be published to {} {chunk_note}",
            check(),
            report.branch.accent(),
            report.remote.accent()
        );
    } else {
        println!(
            "{} Published {} to {} {chunk_note}",
            check(),
            report.branch.emphasis(),
            report.remote.accent()
        );
    }
    if report.resumed_checkpoints > 0 {
        println!(
            "  {}",
            format!("resumed from {} earlier checkpoints", report.resumed_checkpoints).muted()
        );
    }
}
