//! Bulk git repository updater.
//!
//! This crate pulls many working copies at once while refusing to touch one
//! whose local state could be lost:
//! - Checking that a remote, a branch and an upstream exist
//! - Skipping repositories with uncommitted changes
//! - Optionally pulling past untracked files when no incoming change touches them
//! - Classifying each repository as updated, up to date, skipped or failed

pub mod cli;
pub mod config;
pub mod conflict;
pub mod constants;
pub mod error;
pub mod git;
pub mod log;
pub mod output;
pub mod pull;
pub mod repo;
pub mod status;
pub mod workspace;
