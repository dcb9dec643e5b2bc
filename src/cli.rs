//! Command-line arguments.

use crate::config::{Config, Verbosity};
use crate::constants;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Pull every given repository, skipping any whose local work could be lost.
#[derive(Debug, Parser)]
#[command(name = "gittyup", version, about)]
pub struct Cli {
    /// Repositories to update (defaults to the current directory)
    pub paths: Vec<PathBuf>,

    /// Pull repositories even when they have uncommitted changes
    #[arg(long)]
    pub allow_dirty: bool,

    /// Pull repositories whose only changes are untracked files, unless the
    /// pull would overwrite one of them
    #[arg(long)]
    pub ignore_untracked: bool,

    /// Number of repositories to update in parallel
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Timeout in seconds for each git command (default: $GITTYUP_TIMEOUT or 60)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Append a JSON line per repository to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Only print the final count and failures
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print every git command and step; repositories are updated one at a time
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub fn config(&self) -> Config {
        let verbosity = if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Config {
            verbosity,
            skip_dirty: !self.allow_dirty,
            ignore_untracked: self.ignore_untracked,
            jobs: self.jobs.unwrap_or(constants::DEFAULT_WORKER_COUNT),
            timeout: self
                .timeout
                .filter(|secs| *secs > 0)
                .map_or_else(constants::git_timeout, Duration::from_secs),
        }
    }
}
