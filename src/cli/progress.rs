//! Shared CLI progress callback with styled output and spinners

use crate::cli::style::{arrow, check, cross, spinner_style, Stylize};
use anstream::{eprintln, println};
use async_trait::async_trait;
use chunk_push::config::ByteSize;
use chunk_push::error::Error;
use chunk_push::publish::{Phase, ProgressCallback, SizeCheck, TransferStatus};
use chunk_push::types::{CommitId, PushRequest};
use indicatif::ProgressBar;
use std::sync::Mutex;
use std::time::Duration;

/// CLI progress callback that prints to stdout with styled output
///
/// Two modes:
/// - verbose (push): every phase, estimate and transfer
/// - compact (push-all): one indented line per transfer and checkpoint
pub struct CliProgress {
    /// Verbose mode shows all phases and estimates
    pub verbose: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    /// Create verbose progress (for push command)
    pub const fn verbose() -> Self {
        Self {
            verbose: true,
            spinner: Mutex::new(None),
        }
    }

    /// Create compact progress (for push-all command)
    pub const fn compact() -> Self {
        Self {
            verbose: false,
            spinner: Mutex::new(None),
        }
    }

    fn indent(&self) -> &'static str {
        if self.verbose { "  " } else { "    " }
    }

    fn start_spinner(&self, message: String) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(bar);
        }
    }

    fn stop_spinner(&self) {
        let bar = self.spinner.lock().ok().and_then(|mut slot| slot.take());
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_phase(&self, phase: Phase) {
        if self.verbose {
            println!("{}...", phase.to_string().emphasis());
        } else if phase == Phase::CleaningUp {
            println!("  {}...", phase.to_string().muted());
        }
    }

    async fn on_branch(&self, branch: &str, index: usize, total: usize) {
        println!(
            "{} {}",
            format!("[{}/{total}]", index + 1).muted(),
            branch.accent()
        );
    }

    async fn on_size_check(&self, check: &SizeCheck) {
        if !self.verbose {
            return;
        }
        let size = ByteSize(check.size).to_string();
        if check.fits() {
            println!(
                "  {} {} fits {}",
                check.commit.short().accent(),
                size.muted(),
                format!("(budget {})", ByteSize(check.budget)).muted()
            );
        } else {
            println!(
                "  {} {} {}",
                check.commit.short().accent(),
                size.warn().for_stdout(),
                format!("over budget of {}", ByteSize(check.budget)).muted()
            );
        }
    }

    async fn on_transfer(&self, request: &PushRequest, status: TransferStatus) {
        let dest = request.destination();
        let indent = self.indent();
        match &status {
            TransferStatus::Started => {
                self.start_spinner(format!("Pushing {dest}..."));
            }
            TransferStatus::Success => {
                self.stop_spinner();
                println!("{indent}{} Pushed {}", check(), dest.emphasis());
            }
            TransferStatus::Simulated => {
                println!("{indent}{} Would run: {}", arrow(), request.to_string().accent());
            }
            TransferStatus::Retrying(_) => {
                self.stop_spinner();
                eprintln!(
                    "{indent}{} {}",
                    dest.accent().for_stderr(),
                    status.to_string().warn()
                );
            }
            TransferStatus::Failed(_) => {
                self.stop_spinner();
                eprintln!(
                    "{indent}{} Push of {} {}",
                    cross(),
                    dest.accent().for_stderr(),
                    status.to_string().error()
                );
            }
        }
    }

    async fn on_checkpoint(&self, commit: &CommitId) {
        println!(
            "{}{} Checkpoint at {}",
            self.indent(),
            check(),
            commit.short().accent()
        );
    }

    async fn on_error(&self, err: &Error) {
        self.stop_spinner();
        eprintln!("{}{}: {}", self.indent(), "error".error(), err);
    }

    async fn on_message(&self, message: &str) {
        if self.verbose {
            println!("{message}");
        } else {
            println!("  {}", message.muted());
        }
    }
}
