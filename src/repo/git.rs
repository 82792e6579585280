//! `GitStore` backed by the system `git` binary
//!
//! Every call shells out through [`tokio::process::Command`] and is awaited
//! before the next one starts. Revision lists are fed on stdin so the number
//! of excluded checkpoints is not bounded by the argument list.

use crate::error::{Error, Result};
use crate::repo::GitStore;
use crate::types::{CommitId, ObjectId, PushRequest, RefEntry};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

/// A git repository on the local filesystem
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    /// Open the repository containing `path`
    pub async fn open(path: &Path) -> Result<Self> {
        let repo = Self {
            path: path.to_path_buf(),
        };
        let output = repo.run(&["rev-parse", "--git-dir"], None).await?;
        if !output.status.success() {
            return Err(Error::NotARepository(path.display().to_string()));
        }
        Ok(repo)
    }

    /// Run git with `args`, optionally writing `input` to its stdin
    #[instrument(skip(self, input), fields(repo = %self.path.display()))]
    async fn run(&self, args: &[&str], input: Option<String>) -> Result<Output> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.path).args(args);
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn()?;

        // cat-file answers line by line, so stdin is fed from a separate task
        // to keep a full stdout pipe from stalling the writer.
        let writer = match (input, child.stdin.take()) {
            (Some(input), Some(mut stdin)) => Some(tokio::spawn(async move {
                stdin.write_all(input.as_bytes()).await?;
                stdin.shutdown().await
            })),
            _ => None,
        };

        let output = child.wait_with_output().await?;
        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                // git may exit before reading all input; its status says why
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => return Err(e.into()),
                Err(e) => return Err(Error::Git(format!("stdin writer failed: {e}"))),
            }
        }

        debug!(status = %output.status, "git {}", args.join(" "));
        Ok(output)
    }

    /// Run git and return stdout, failing on a non-zero exit
    async fn run_checked(&self, args: &[&str], input: Option<String>) -> Result<String> {
        let output = self.run(args, input).await?;
        if !output.status.success() {
            return Err(Error::Git(format!(
                "git {} (status {}): {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| Error::Parse(format!("non-UTF-8 output from git {}: {e}", args[0])))
    }
}

#[async_trait]
impl GitStore for GitRepo {
    async fn resolve_ref(&self, name: &str) -> Result<CommitId> {
        let spec = format!("{name}^{{commit}}");
        let output = self
            .run(&["rev-parse", "--verify", "--quiet", &spec], None)
            .await?;
        if !output.status.success() {
            return Err(Error::RefNotFound(name.to_string()));
        }
        let hex = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if hex.is_empty() {
            return Err(Error::RefNotFound(name.to_string()));
        }
        Ok(CommitId::new(hex))
    }

    async fn current_branch(&self) -> Result<String> {
        let output = self
            .run(&["symbolic-ref", "--quiet", "--short", "HEAD"], None)
            .await?;
        if !output.status.success() {
            return Err(Error::Precondition(
                "HEAD is detached; check out a branch or pass --branch".to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn remote_names(&self) -> Result<Vec<String>> {
        let stdout = self.run_checked(&["remote"], None).await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    async fn list_refs(&self, prefix: &str) -> Result<Vec<RefEntry>> {
        let pattern = prefix.trim_end_matches('/');
        let stdout = self
            .run_checked(
                &[
                    "for-each-ref",
                    "--sort=refname",
                    "--format=%(objectname) %(refname)",
                    pattern,
                ],
                None,
            )
            .await?;
        let mut refs = parse_ref_lines(&stdout)?;
        refs.retain(|r| r.name.starts_with(prefix));
        Ok(refs)
    }

    async fn list_remote_refs(&self, remote: &str, prefix: &str) -> Result<Vec<RefEntry>> {
        let pattern = format!("{}/*", prefix.trim_end_matches('/'));
        let stdout = self
            .run_checked(&["ls-remote", "--refs", remote, &pattern], None)
            .await?;
        let mut refs = parse_ref_lines(&stdout)?;
        refs.retain(|r| r.name.starts_with(prefix));
        refs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(refs)
    }

    async fn commits_between(
        &self,
        tip: &CommitId,
        excluding: &[CommitId],
    ) -> Result<Vec<CommitId>> {
        let stdout = self
            .run_checked(
                &["rev-list", "--topo-order", "--reverse", "--stdin"],
                Some(revs_input(tip, excluding)),
            )
            .await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(CommitId::new)
            .collect())
    }

    async fn reachable_objects(
        &self,
        tip: &CommitId,
        excluding: &[CommitId],
    ) -> Result<Vec<ObjectId>> {
        let stdout = self
            .run_checked(
                &["rev-list", "--objects", "--stdin"],
                Some(revs_input(tip, excluding)),
            )
            .await?;
        Ok(parse_object_lines(&stdout))
    }

    async fn object_disk_sizes(&self, objects: &[ObjectId]) -> Result<Vec<u64>> {
        if objects.is_empty() {
            return Ok(Vec::new());
        }
        let mut input = String::with_capacity(objects.len() * 41);
        for id in objects {
            input.push_str(id.as_str());
            input.push('\n');
        }
        let stdout = self
            .run_checked(
                &["cat-file", "--batch-check=%(objectname) %(objectsize:disk)"],
                Some(input),
            )
            .await?;
        let sizes = parse_disk_sizes(&stdout)?;
        if sizes.len() != objects.len() {
            return Err(Error::Parse(format!(
                "asked for {} object sizes, got {}",
                objects.len(),
                sizes.len()
            )));
        }
        Ok(sizes)
    }

    async fn update_ref(&self, name: &str, commit: &CommitId) -> Result<()> {
        self.run_checked(&["update-ref", name, commit.as_str()], None)
            .await?;
        Ok(())
    }

    async fn delete_ref(&self, name: &str) -> Result<()> {
        self.run_checked(&["update-ref", "-d", name], None).await?;
        Ok(())
    }

    async fn push(&self, request: &PushRequest) -> Result<()> {
        let refspecs: Vec<String> = request.refspecs.iter().map(ToString::to_string).collect();
        let mut args = vec!["push"];
        if request.force {
            args.push("--force");
        }
        if request.prune {
            args.push("--prune");
        }
        args.push(request.remote.as_str());
        args.extend(refspecs.iter().map(String::as_str));

        let output = self.run(&args, None).await?;
        if !output.status.success() {
            return Err(Error::TransferRejected {
                dest: request.destination(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Revision list for `git rev-list --stdin`: the tip, then negated exclusions
fn revs_input(tip: &CommitId, excluding: &[CommitId]) -> String {
    let mut input = format!("{tip}\n");
    for commit in excluding {
        input.push('^');
        input.push_str(commit.as_str());
        input.push('\n');
    }
    input
}

/// Parse `%(objectname) %(refname)` lines (or tab-separated `ls-remote` output)
fn parse_ref_lines(stdout: &str) -> Result<Vec<RefEntry>> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let (commit, name) = line
                .split_once([' ', '\t'])
                .ok_or_else(|| Error::Parse(format!("malformed ref line: {line}")))?;
            Ok(RefEntry {
                name: name.trim().to_string(),
                commit: CommitId::new(commit.trim()),
            })
        })
        .collect()
}

/// Parse `rev-list --objects` output (`<id> [path]` per line)
fn parse_object_lines(stdout: &str) -> Vec<ObjectId> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(ObjectId::new)
        .collect()
}

/// Parse `%(objectname) %(objectsize:disk)` lines
fn parse_disk_sizes(stdout: &str) -> Result<Vec<u64>> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let mut parts = line.split_whitespace();
            let id = parts.next().unwrap_or_default();
            match parts.next() {
                Some("missing") => Err(Error::Git(format!("object {id} is missing"))),
                Some(size) => size
                    .parse::<u64>()
                    .map_err(|_| Error::Parse(format!("bad object size line: {line}"))),
                None => Err(Error::Parse(format!("bad object size line: {line}"))),
            }
        })
        .collect()
}
