//! Errors raised by the git command gateway.

use thiserror::Error;

/// A git invocation that could not produce a usable result.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Failed to spawn git command `git {command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for git command `git {command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command} timed out after {secs} seconds")]
    Timeout { command: String, secs: u64 },

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
}
