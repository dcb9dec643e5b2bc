//! Application-wide constants.
//!
//! Tunables shared by the gateway, the updater and the console output.

use std::time::Duration;

/// Default timeout for individual git operations (in seconds).
const DEFAULT_GIT_TIMEOUT_SECS: u64 = 60;

/// Environment variable overriding the git command timeout.
pub const TIMEOUT_ENV_VAR: &str = "GITTYUP_TIMEOUT";

/// Returns the git command timeout.
///
/// Can be customized via the GITTYUP_TIMEOUT environment variable (in seconds).
/// Falls back to 60 seconds if not set or invalid.
///
/// Example: `GITTYUP_TIMEOUT=120 gittyup ~/src/*`
pub fn git_timeout() -> Duration {
    std::env::var(TIMEOUT_ENV_VAR)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_GIT_TIMEOUT_SECS))
}

/// Number of worker threads for parallel repository updates.
/// Higher than CPU count because git operations are I/O-bound (network, disk).
pub const DEFAULT_WORKER_COUNT: usize = 60;

/// Progress bar tick interval in milliseconds.
pub const PROGRESS_TICK_MS: u64 = 80;

/// Maximum number of completed repositories to show in the workspace progress display.
pub const MAX_VISIBLE_COMPLETIONS: usize = 5;

/// Default name used when a repository name cannot be determined from its path.
pub const DEFAULT_REPO_NAME: &str = "repository";

/// Name git reports for the current branch when HEAD is detached.
pub const DETACHED_HEAD: &str = "HEAD";

/// File and directory names that never make a repository dirty.
pub const ALWAYS_IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "__pycache__"];

/// Phrases git prints when a pull had nothing to integrate.
pub const UP_TO_DATE_PHRASES: &[&str] = &["Already up to date", "Already up-to-date"];

/// Longest raw error line shown before truncation.
pub const MAX_ERROR_MESSAGE_LEN: usize = 100;
