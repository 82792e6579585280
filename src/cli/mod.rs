//! CLI commands
//!
//! Command implementations for the `git-chunk-push` binary.

mod cleanup;
mod estimate;
mod progress;
mod push;
mod push_all;
mod style;

pub use cleanup::run_cleanup;
pub use estimate::run_estimate;
pub use push::run_push;
pub use push_all::run_push_all;
