//! git-chunk-push - push large git histories in size-bounded chunks
//!
//! CLI binary. Installed on `PATH` it also runs as `git chunk-push`.

use anyhow::Result;
use chunk_push::config::{ByteSize, DEFAULT_NAMESPACE, DEFAULT_REMOTE, PublishConfig};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;

#[derive(Parser)]
#[command(name = "git-chunk-push")]
#[command(about = "Push large git histories in size-bounded chunks")]
#[command(version, subcommand_precedence_over_arg = true)]
struct Cli {
    /// Path to git repository (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    path: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Options for the default `push` command
    #[command(flatten)]
    push: PushArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Push one branch in chunks (default)
    Push(PushArgs),

    /// Push every local branch in chunks, one after the other
    PushAll(PublishArgs),

    /// Show the unpublished size of a revision
    Estimate {
        /// Revision to estimate (defaults to HEAD)
        rev: Option<String>,

        /// Budget to compare against
        #[arg(long, env = "MAX_PUSH_SIZE", default_value = "2000000000")]
        max_size: ByteSize,

        /// Ref namespace holding checkpoints
        #[arg(long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },

    /// Delete leftover checkpoints locally and on the remote
    Cleanup {
        /// Git remote holding the checkpoints
        #[arg(default_value = DEFAULT_REMOTE)]
        remote: String,

        /// Dry run - show what would be done without making changes
        #[arg(long, env = "DRY_RUN", action = ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
        dry_run: bool,

        /// Ref namespace holding checkpoints
        #[arg(long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },
}

#[derive(Args, Clone)]
struct PublishArgs {
    /// Git remote to push to
    #[arg(default_value = DEFAULT_REMOTE)]
    remote: String,

    /// Maximum estimated size of one transfer (e.g. 2000000000, 500M, 2G, 1.5GiB)
    #[arg(long, env = "MAX_PUSH_SIZE", default_value = "2000000000")]
    max_size: ByteSize,

    /// Dry run - show what would be pushed without pushing
    #[arg(long, env = "DRY_RUN", action = ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    dry_run: bool,

    /// Ref namespace for temporary checkpoints
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Retry a rejected transfer this many times before splitting it
    #[arg(long, default_value_t = 0)]
    transfer_retries: u32,

    /// Print a JSON report instead of progress output
    #[arg(long)]
    json: bool,
}

impl PublishArgs {
    fn config(&self) -> PublishConfig {
        PublishConfig {
            remote: self.remote.clone(),
            budget: self.max_size.bytes(),
            dry_run: self.dry_run,
            namespace: self.namespace.clone(),
            transfer_retries: self.transfer_retries,
        }
    }
}

#[derive(Args, Clone)]
struct PushArgs {
    #[command(flatten)]
    publish: PublishArgs,

    /// Branch to publish (defaults to the current branch)
    #[arg(long)]
    branch: Option<String>,

    /// Revision to publish as the branch (defaults to the branch tip)
    #[arg(long)]
    rev: Option<String>,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let path = cli.path.unwrap_or_else(|| PathBuf::from("."));

    match cli.command.unwrap_or(Commands::Push(cli.push)) {
        Commands::Push(args) => {
            cli::run_push(
                &path,
                args.publish.config(),
                args.branch.as_deref(),
                args.rev.as_deref(),
                args.publish.json,
            )
            .await?;
        }
        Commands::PushAll(args) => {
            cli::run_push_all(&path, args.config(), args.json).await?;
        }
        Commands::Estimate {
            rev,
            max_size,
            namespace,
        } => {
            cli::run_estimate(&path, rev.as_deref(), max_size, &namespace).await?;
        }
        Commands::Cleanup {
            remote,
            dry_run,
            namespace,
        } => {
            cli::run_cleanup(&path, &remote, &namespace, dry_run).await?;
        }
    }

    Ok(())
}
