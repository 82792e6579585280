//! Publish configuration
//!
//! Defaults mirror the environment-driven behavior of the CLI: remote
//! `origin`, a 2 GB budget, and checkpoints under `refs/chunk-push`.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Remote used when none is given
pub const DEFAULT_REMOTE: &str = "origin";

/// Default per-transfer budget in bytes
pub const DEFAULT_MAX_PUSH_SIZE: u64 = 2_000_000_000;

/// Reserved ref namespace for checkpoint markers
pub const DEFAULT_NAMESPACE: &str = "refs/chunk-push";

/// A byte count, parsed from `2000000000`, `500M`, `2G`, `1.5GiB`, ...
///
/// Plain suffixes are decimal (k = 1000), `i` suffixes are binary
/// (Ki = 1024). A trailing `B` is accepted and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ByteSize(pub u64);

impl ByteSize {
    /// Number of bytes
    pub const fn bytes(self) -> u64 {
        self.0
    }

    /// Render with a decimal unit, e.g. `1.86 GB`
    #[allow(clippy::cast_precision_loss)]
    pub fn human(self) -> String {
        const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];
        if self.0 < 1000 {
            return format!("{} B", self.0);
        }
        let mut value = self.0 as f64;
        let mut unit = 0;
        while value >= 1000.0 && unit < UNITS.len() - 1 {
            value /= 1000.0;
            unit += 1;
        }
        format!("{value:.2} {}", UNITS[unit])
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.human())
    }
}

fn size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*([kKmMgGtT]?)(i?)[bB]?\s*$")
            .expect("hardcoded size pattern is valid")
    })
}

impl FromStr for ByteSize {
    type Err = Error;

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn from_str(s: &str) -> Result<Self> {
        let caps = size_pattern()
            .captures(s)
            .ok_or_else(|| Error::InvalidSize(s.to_string()))?;

        let number = &caps[1];
        let exponent: i32 = match caps[2].to_ascii_lowercase().as_str() {
            "" => 0,
            "k" => 1,
            "m" => 2,
            "g" => 3,
            "t" => 4,
            _ => return Err(Error::InvalidSize(s.to_string())),
        };
        let base: u64 = if caps[3].is_empty() { 1000 } else { 1024 };

        // Integers stay exact; fractions go through f64
        if let Ok(whole) = number.parse::<u64>() {
            return base
                .checked_pow(exponent.unsigned_abs())
                .and_then(|m| whole.checked_mul(m))
                .map(Self)
                .ok_or_else(|| Error::InvalidSize(format!("{s} is too large")));
        }

        let value: f64 = number
            .parse()
            .map_err(|_| Error::InvalidSize(s.to_string()))?;
        let bytes = value * (base as f64).powi(exponent);
        if !bytes.is_finite() || bytes >= u64::MAX as f64 {
            return Err(Error::InvalidSize(format!("{s} is too large")));
        }
        Ok(Self(bytes.round() as u64))
    }
}

/// Settings for one publish run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
    /// Remote to publish to
    pub remote: String,
    /// Maximum estimated size of any single transfer, in bytes
    pub budget: u64,
    /// Print transfers instead of executing them
    pub dry_run: bool,
    /// Ref namespace holding checkpoint markers
    pub namespace: String,
    /// Blind retries of a rejected transfer before narrowing
    pub transfer_retries: u32,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            remote: DEFAULT_REMOTE.to_string(),
            budget: DEFAULT_MAX_PUSH_SIZE,
            dry_run: false,
            namespace: DEFAULT_NAMESPACE.to_string(),
            transfer_retries: 0,
        }
    }
}

impl PublishConfig {
    /// Config for `remote` with the given budget and defaults elsewhere
    pub fn new(remote: impl Into<String>, budget: u64) -> Self {
        Self {
            remote: remote.into(),
            budget,
            ..Self::default()
        }
    }

    /// Check that the namespace can hold checkpoint refs
    ///
    /// The namespace must live under `refs/`, must not be a branch or tag
    /// namespace, and must not contain glob characters (it is used in a
    /// wildcard refspec when pruning).
    pub fn validate(&self) -> Result<()> {
        let ns = self.namespace.trim_end_matches('/');
        let invalid = |why: &str| Err(Error::InvalidNamespace(format!("{ns}: {why}")));

        if !ns.starts_with("refs/") || ns.len() <= "refs/".len() {
            return invalid("must be below refs/");
        }
        if ns == "refs/heads" || ns.starts_with("refs/heads/") {
            return invalid("must not overlap branches");
        }
        if ns == "refs/tags" || ns.starts_with("refs/tags/") {
            return invalid("must not overlap tags");
        }
        if ns.contains(['*', '?', '[', ' ', ':', '^', '~']) {
            return invalid("contains characters not allowed in a ref prefix");
        }
        Ok(())
    }
}
