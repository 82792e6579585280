//! Chunked publishing driver
//!
//! Tries to push the whole branch; when the estimate is over budget (or the
//! remote refuses), publishes one bisected chunk to a checkpoint ref and
//! tries again. Every chunk moves the checkpoint frontier forward, so the
//! remaining estimate strictly decreases until the branch push fits.

use crate::checkpoint::CheckpointStore;
use crate::config::PublishConfig;
use crate::error::{Error, Result};
use crate::publish::bisect::{Bisection, Probe};
use crate::publish::estimate::{estimate_size, SizeCheck};
use crate::publish::{Phase, ProgressCallback, TransferStatus};
use crate::repo::GitStore;
use crate::types::{CommitId, PushRequest};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Result of one size-check-then-transfer attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishAttempt {
    /// The remote accepted the transfer (or a dry run printed it)
    Published {
        /// Estimated size of the transfer
        size: u64,
    },
    /// Estimated over budget; nothing was sent
    SizeExceeded {
        /// Estimated size of the candidate
        size: u64,
    },
    /// Within budget but the remote refused
    Rejected {
        /// Estimated size of the candidate
        size: u64,
        /// Diagnostic output from git
        message: String,
    },
}

/// A chunk published to a checkpoint ref
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkRecord {
    /// Commit the checkpoint points to
    pub commit: CommitId,
    /// Estimated size of the chunk
    pub size: u64,
}

/// Summary of a completed publish
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    /// Published branch
    pub branch: String,
    /// Remote it was published to
    pub remote: String,
    /// Commit the branch now points to on the remote
    pub target: CommitId,
    /// Per-transfer budget in bytes
    pub budget: u64,
    /// Whether transfers were only printed
    pub dry_run: bool,
    /// Checkpoints left by an earlier run that this run started from
    pub resumed_checkpoints: usize,
    /// Chunks published before the branch itself, in order
    pub chunks: Vec<ChunkRecord>,
    /// Remaining-size estimate at every whole-branch attempt, in order
    pub estimates: Vec<u64>,
    /// Transfers executed (or simulated), including cleanup
    pub transfers: usize,
}

enum TransferOutcome {
    Accepted,
    Rejected(String),
}

/// Publishes one branch in size-bounded chunks
pub struct ChunkedPublisher<'a> {
    store: &'a dyn GitStore,
    progress: &'a dyn ProgressCallback,
    config: PublishConfig,
    branch: String,
    target: CommitId,
    checkpoints: CheckpointStore<'a>,
    report: PublishReport,
}

impl<'a> ChunkedPublisher<'a> {
    /// Publisher for `target` as `branch` on the configured remote
    ///
    /// Fails before any transfer when the config is invalid or the remote
    /// does not exist. Checkpoints already present in the namespace are
    /// picked up as the starting frontier.
    pub async fn new(
        store: &'a dyn GitStore,
        progress: &'a dyn ProgressCallback,
        config: PublishConfig,
        branch: &str,
        target: CommitId,
    ) -> Result<Self> {
        config.validate()?;

        let remotes = store.remote_names().await?;
        if !remotes.iter().any(|r| *r == config.remote) {
            return Err(Error::RemoteNotFound(config.remote));
        }

        let checkpoints = CheckpointStore::new(store, &config.namespace, config.dry_run);
        let resumed = checkpoints.list().await?.len();
        if resumed > 0 {
            info!("Resuming from {resumed} existing checkpoints");
            progress
                .on_message(&format!("Resuming from {resumed} existing checkpoints"))
                .await;
        }

        let report = PublishReport {
            branch: branch.to_string(),
            remote: config.remote.clone(),
            target: target.clone(),
            budget: config.budget,
            dry_run: config.dry_run,
            resumed_checkpoints: resumed,
            chunks: Vec::new(),
            estimates: Vec::new(),
            transfers: 0,
        };

        Ok(Self {
            store,
            progress,
            config,
            branch: branch.to_string(),
            target,
            checkpoints,
            report,
        })
    }

    /// Publisher for a local branch (the checked-out one when `branch` is
    /// `None`), targeting its tip or `rev` when given
    pub async fn for_branch(
        store: &'a dyn GitStore,
        progress: &'a dyn ProgressCallback,
        config: PublishConfig,
        branch: Option<&str>,
        rev: Option<&str>,
    ) -> Result<Self> {
        let branch = match branch {
            Some(name) => name.to_string(),
            None => store.current_branch().await?,
        };
        let target = match rev {
            Some(rev) => store.resolve_ref(rev).await?,
            None => store
                .resolve_ref(&format!("refs/heads/{branch}"))
                .await
                .map_err(|_| Error::Precondition(format!("no local branch named {branch}")))?,
        };
        Self::new(store, progress, config, &branch, target).await
    }

    /// Commit being published
    pub const fn target(&self) -> &CommitId {
        &self.target
    }

    /// Branch being published
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Checkpoint store of this run
    pub const fn checkpoints(&self) -> &CheckpointStore<'a> {
        &self.checkpoints
    }

    /// Estimated unpublished size of `commit` (the target if `None`)
    pub async fn estimate_size(&self, commit: Option<&CommitId>) -> Result<u64> {
        let commit = commit.unwrap_or(&self.target);
        let frontier = self.checkpoints.frontier().await?;
        estimate_size(self.store, commit, &frontier).await
    }

    /// Compare the estimate of `commit` (the target if `None`) with the budget
    pub async fn check_size(&self, commit: Option<&CommitId>) -> Result<SizeCheck> {
        let size = self.estimate_size(commit).await?;
        let check = SizeCheck {
            commit: commit.unwrap_or(&self.target).clone(),
            size,
            budget: self.config.budget,
        };
        if !check.fits() {
            debug!(
                "{} is {} bytes, over the budget of {}",
                check.commit.short(),
                check.size,
                check.budget
            );
        }
        self.progress.on_size_check(&check).await;
        Ok(check)
    }

    /// Push the target to the real branch if it fits in one transfer
    pub async fn publish_branch(&mut self) -> Result<PublishAttempt> {
        let check = self.check_size(None).await?;
        self.report.estimates.push(check.size);
        if !check.fits() {
            return Ok(PublishAttempt::SizeExceeded { size: check.size });
        }

        let dest = format!("refs/heads/{}", self.branch);
        let request = PushRequest::force_update(&self.config.remote, &self.target, &dest);
        Ok(match self.transfer(&request).await? {
            TransferOutcome::Accepted => PublishAttempt::Published { size: check.size },
            TransferOutcome::Rejected(message) => PublishAttempt::Rejected {
                size: check.size,
                message,
            },
        })
    }

    /// Push `commit` to its checkpoint slot on the remote if it fits
    ///
    /// Does not record the local marker; see [`Self::publish_chunk`].
    pub async fn publish_rev(&mut self, commit: &CommitId) -> Result<PublishAttempt> {
        let check = self.check_size(Some(commit)).await?;
        if !check.fits() {
            return Ok(PublishAttempt::SizeExceeded { size: check.size });
        }

        let dest = self.checkpoints.marker_name(commit);
        let request = PushRequest::force_update(&self.config.remote, commit, &dest);
        Ok(match self.transfer(&request).await? {
            TransferOutcome::Accepted => PublishAttempt::Published { size: check.size },
            TransferOutcome::Rejected(message) => PublishAttempt::Rejected {
                size: check.size,
                message,
            },
        })
    }

    /// Publish one chunk of history and checkpoint it
    ///
    /// Bisects the unpublished commits, halving the range after every
    /// failed attempt. Fails with [`Error::Unreducible`] when a single
    /// commit cannot be published on its own.
    pub async fn publish_chunk(&mut self) -> Result<CommitId> {
        self.progress.on_phase(Phase::Bisecting).await;

        let frontier = self.checkpoints.frontier().await?;
        let candidates = self.store.commits_between(&self.target, &frontier).await?;
        let Some(mut bisection) = Bisection::new(candidates) else {
            return Err(Error::TransferRejected {
                dest: format!("refs/heads/{}", self.branch),
                message: "no unpublished commits left to split".to_string(),
            });
        };
        debug!("Bisecting {} unpublished commits", bisection.len());

        loop {
            let commit = match bisection.probe() {
                Probe::Try(commit) => commit.clone(),
                Probe::Unreducible(commit) => {
                    let commit = commit.clone();
                    let size = self.estimate_size(Some(&commit)).await?;
                    warn!("Cannot reduce push size further at {commit}");
                    return Err(Error::Unreducible {
                        commit,
                        size,
                        budget: self.config.budget,
                    });
                }
            };

            match self.publish_rev(&commit).await? {
                PublishAttempt::Published { size } => {
                    // Only after the remote acknowledged the transfer
                    self.checkpoints.create(&commit).await?;
                    self.progress.on_checkpoint(&commit).await;
                    info!("Published chunk {} ({size} bytes)", commit.short());
                    self.report.chunks.push(ChunkRecord {
                        commit: commit.clone(),
                        size,
                    });
                    return Ok(commit);
                }
                PublishAttempt::SizeExceeded { .. } | PublishAttempt::Rejected { .. } => {
                    bisection.narrow();
                }
            }
        }
    }

    /// Delete the local markers, then prune the remote ones in one transfer
    ///
    /// The prune is skipped when the remote holds no marker, unless a dry
    /// run simulated checkpoints it would have pushed.
    pub async fn cleanup(&mut self) -> Result<()> {
        self.progress.on_phase(Phase::CleaningUp).await;

        let removed = self.checkpoints.delete_local().await?;
        debug!("Deleted {removed} local checkpoints");

        let on_remote = self
            .checkpoints
            .remote_markers(&self.config.remote)
            .await?;
        if on_remote.is_empty() && !(self.config.dry_run && removed > 0) {
            debug!("No checkpoints on {}, skipping prune", self.config.remote);
            return Ok(());
        }

        let request = self.checkpoints.prune_request(&self.config.remote);
        match self.transfer(&request).await? {
            TransferOutcome::Accepted => Ok(()),
            TransferOutcome::Rejected(message) => Err(Error::TransferRejected {
                dest: request.destination(),
                message,
            }),
        }
    }

    /// Publish the branch, chunking as needed, then clean up
    pub async fn run(mut self) -> Result<PublishReport> {
        info!(
            "Publishing {} ({}) to {} with a budget of {} bytes",
            self.branch,
            self.target.short(),
            self.config.remote,
            self.config.budget
        );

        loop {
            self.progress.on_phase(Phase::Estimating).await;
            match self.publish_branch().await? {
                PublishAttempt::Published { .. } => break,
                PublishAttempt::SizeExceeded { .. } => {}
                PublishAttempt::Rejected { message, .. } => {
                    // Retried after the next chunk
                    let err = Error::TransferRejected {
                        dest: format!("refs/heads/{}", self.branch),
                        message,
                    };
                    self.progress.on_error(&err).await;
                }
            }
            self.publish_chunk().await?;
        }

        self.cleanup().await?;
        self.progress.on_phase(Phase::Complete).await;
        Ok(self.report)
    }

    /// Execute (or, in a dry run, print) one transfer
    ///
    /// Rejections are retried as-is up to `transfer_retries` times before
    /// being reported; other failures abort.
    async fn transfer(&mut self, request: &PushRequest) -> Result<TransferOutcome> {
        self.report.transfers += 1;
        if self.config.dry_run {
            self.progress
                .on_transfer(request, TransferStatus::Simulated)
                .await;
            return Ok(TransferOutcome::Accepted);
        }

        let mut retries_left = self.config.transfer_retries;
        loop {
            self.progress
                .on_transfer(request, TransferStatus::Started)
                .await;

            match self.store.push(request).await {
                Ok(()) => {
                    self.progress
                        .on_transfer(request, TransferStatus::Success)
                        .await;
                    return Ok(TransferOutcome::Accepted);
                }
                Err(Error::TransferRejected { message, .. }) if retries_left > 0 => {
                    retries_left -= 1;
                    warn!("Transfer to {} rejected, retrying: {message}", request.destination());
                    self.progress
                        .on_transfer(request, TransferStatus::Retrying(message))
                        .await;
                    self.report.transfers += 1;
                }
                Err(Error::TransferRejected { message, .. }) => {
                    self.progress
                        .on_transfer(request, TransferStatus::Failed(message.clone()))
                        .await;
                    return Ok(TransferOutcome::Rejected(message));
                }
                Err(e) => return Err(e),
            }
        }
    }
}
