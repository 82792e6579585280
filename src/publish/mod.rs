//! Size-bounded publishing engine
//!
//! Handles publishing a branch whose history is too large for one push:
//! 1. Estimation - size of everything not yet behind a checkpoint
//! 2. Bisection - find a commit whose unpublished objects fit the budget
//! 3. Execution - push it to a checkpoint ref, repeat, then push the branch

mod all;
mod bisect;
mod estimate;
mod execute;
mod progress;

pub use all::publish_all_branches;
pub use bisect::{Bisection, Probe};
pub use estimate::{estimate_size, SizeCheck};
pub use execute::{ChunkRecord, ChunkedPublisher, PublishAttempt, PublishReport};
pub use progress::{NoopProgress, Phase, ProgressCallback, TransferStatus};
