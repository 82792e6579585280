//! Core types for git-chunk-push

use serde::{Deserialize, Serialize};
use std::fmt;

/// A git commit ID (hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Wrap a hex object name
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Full hex form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display (first 12 characters)
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A git object ID of any kind (commit, tree, blob, tag)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Wrap a hex object name
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Full hex form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reference and the commit it points to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefEntry {
    /// Full ref name (e.g., "refs/heads/main")
    pub name: String,
    /// Commit the ref points to
    pub commit: CommitId,
}

impl RefEntry {
    /// Branch name for refs under `refs/heads/`
    pub fn branch_name(&self) -> Option<&str> {
        self.name.strip_prefix("refs/heads/")
    }
}

/// One `src:dst` pair of a push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefSpec {
    /// Local revision to send; `None` deletes `dst` on the remote
    pub src: Option<String>,
    /// Destination ref on the remote
    pub dst: String,
}

impl RefSpec {
    /// Update `dst` to point at `src`
    pub fn update(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            dst: dst.into(),
        }
    }

    /// Delete `dst` on the remote
    pub fn delete(dst: impl Into<String>) -> Self {
        Self {
            src: None,
            dst: dst.into(),
        }
    }
}

impl fmt::Display for RefSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.src {
            Some(src) => write!(f, "{src}:{}", self.dst),
            None => write!(f, ":{}", self.dst),
        }
    }
}

/// A single transfer to a remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    /// Remote name (e.g., "origin")
    pub remote: String,
    /// Force the ref update (non-fast-forward allowed)
    pub force: bool,
    /// Delete remote refs matched by a wildcard refspec but absent locally
    pub prune: bool,
    /// Ref updates carried by this transfer
    pub refspecs: Vec<RefSpec>,
}

impl PushRequest {
    /// Forced update of a single remote ref
    pub fn force_update(remote: &str, src: &CommitId, dst: &str) -> Self {
        Self {
            remote: remote.to_string(),
            force: true,
            prune: false,
            refspecs: vec![RefSpec::update(src.as_str(), dst)],
        }
    }

    /// Human-readable destination summary
    pub fn destination(&self) -> String {
        self.refspecs
            .iter()
            .map(|r| r.dst.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for PushRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "git push")?;
        if self.force {
            write!(f, " --force")?;
        }
        if self.prune {
            write!(f, " --prune")?;
        }
        write!(f, " {}", self.remote)?;
        for spec in &self.refspecs {
            write!(f, " {spec}")?;
        }
        Ok(())
    }
}
