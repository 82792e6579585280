//! Midpoint search over unpublished history
//!
//! Candidates are the unpublished commits of a target in topological order,
//! oldest first, with the target itself last. Publishing candidate `i`
//! sends at most what publishing candidate `j > i` would, so "fits in the
//! budget" is downward-closed along the list. The search starts with the
//! target known to be too big and halves the index range after every failed
//! probe; the range only ever shrinks.

use crate::types::CommitId;

/// Next step of a bisection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe<'a> {
    /// Try to publish this commit
    Try(&'a CommitId),
    /// The range cannot shrink further; this commit failed on its own
    Unreducible(&'a CommitId),
}

/// Bisection state for one chunk
#[derive(Debug, Clone)]
pub struct Bisection {
    candidates: Vec<CommitId>,
    /// Index of the most recent candidate known not to publish
    upper: usize,
}

impl Bisection {
    /// Start a search; `None` if there is nothing left to publish
    ///
    /// The last candidate (the target) is assumed to have failed already.
    pub fn new(candidates: Vec<CommitId>) -> Option<Self> {
        let upper = candidates.len().checked_sub(1)?;
        Some(Self { candidates, upper })
    }

    /// Number of unpublished commits searched
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Always false; an empty search is never constructed
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Index of the next candidate to probe
    pub const fn midpoint(&self) -> usize {
        self.upper / 2
    }

    /// What to do next
    pub fn probe(&self) -> Probe<'_> {
        let mid = self.midpoint();
        if mid == self.upper {
            Probe::Unreducible(&self.candidates[self.upper])
        } else {
            Probe::Try(&self.candidates[mid])
        }
    }

    /// The current probe failed; search strictly below it next
    pub fn narrow(&mut self) {
        self.upper = self.midpoint();
    }
}
