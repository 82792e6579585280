//! git-chunk-push - publish large git histories in size-bounded chunks
//!
//! Remotes often refuse a single push above some pack size. This crate
//! publishes the history reachable from a branch tip in as few transfers as
//! possible while keeping every transfer under a byte budget. Progress is
//! checkpointed with temporary refs so that an interrupted run can resume.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod publish;
pub mod repo;
pub mod types;
