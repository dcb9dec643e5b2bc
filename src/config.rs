//! Configuration types for CLI verbosity and update policy.

use crate::constants::{self, DEFAULT_WORKER_COUNT};
use crate::git::{self, GitLogger};
use crate::repo::UpdateOptions;
use std::time::Duration;

/// Runtime configuration derived from CLI arguments.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Controls the verbosity level of CLI output.
    pub verbosity: Verbosity,
    /// Skip repositories with uncommitted changes instead of pulling them.
    pub skip_dirty: bool,
    /// Treat a repository whose only changes are untracked files as pullable
    /// when the incoming changes do not touch those files.
    pub ignore_untracked: bool,
    /// Maximum number of repositories updated at once.
    pub jobs: usize,
    /// Limit for any single git command.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            skip_dirty: true,
            ignore_untracked: false,
            jobs: DEFAULT_WORKER_COUNT,
            timeout: constants::git_timeout(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Returns the appropriate git logger based on verbosity settings.
    ///
    /// Config only picks which logger function to use; the loggers
    /// themselves live in the git module.
    #[must_use]
    pub fn git_logger(&self) -> GitLogger {
        if self.is_verbose() {
            git::verbose_logger
        } else {
            git::no_op_logger
        }
    }

    #[must_use]
    pub fn update_options(&self) -> UpdateOptions {
        UpdateOptions {
            skip_dirty: self.skip_dirty,
            ignore_untracked: self.ignore_untracked,
        }
    }

    /// Worker threads to use; verbose runs are sequential so command logs stay readable.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        if self.is_verbose() {
            1
        } else {
            self.jobs.max(1)
        }
    }
}

/// Verbosity level for CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}
