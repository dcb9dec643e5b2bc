//! Pull executor and failure summaries.

use crate::constants::{MAX_ERROR_MESSAGE_LEN, UP_TO_DATE_PHRASES};
use crate::error::GitError;
use crate::git::VersionControl;
use std::path::Path;

/// Result of one `git pull`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    pub success: bool,
    pub already_up_to_date: bool,
    pub full_output: String,
}

impl PullOutcome {
    /// A one-line explanation of a failed pull, suitable for a summary.
    #[must_use]
    pub fn error_message(&self) -> String {
        summarize_pull_error(&self.full_output)
    }
}

/// Fetches and integrates the upstream branch of `repo`.
///
/// A pull that ran is always `Ok`, whether or not git succeeded. `Err` means
/// git could not be run or did not finish in time.
pub fn pull_repository<V>(vcs: &V, repo: &Path) -> Result<PullOutcome, GitError>
where
    V: VersionControl + ?Sized,
{
    let output = vcs.pull(repo)?;
    let full_output = output.combined();
    let success = output.success();
    let already_up_to_date = success && is_up_to_date(&full_output);

    Ok(PullOutcome {
        success,
        already_up_to_date,
        full_output,
    })
}

#[must_use]
pub fn is_up_to_date(output: &str) -> bool {
    UP_TO_DATE_PHRASES
        .iter()
        .any(|phrase| output.contains(phrase))
}

// Checked in order: ssh auth failures also say "could not read from remote".
const KNOWN_FAILURES: &[(&[&str], &str)] = &[
    (
        &["merge conflict", "conflict (content)", "automatic merge failed"],
        "Merge conflict detected, resolve it manually",
    ),
    (
        &[
            "authentication failed",
            "permission denied",
            "could not read username",
            "invalid username or password",
        ],
        "Authentication failed for the remote",
    ),
    (
        &[
            "could not resolve host",
            "unable to access",
            "connection refused",
            "connection timed out",
            "network is unreachable",
            "could not read from remote repository",
        ],
        "Network error: could not reach the remote",
    ),
    (
        &["no tracking information"],
        "No upstream branch configured for the current branch",
    ),
    (
        &["would be overwritten by merge", "would be overwritten by checkout"],
        "Local changes would be overwritten by the pull",
    ),
    (
        &["divergent branches", "not possible to fast-forward"],
        "Local and remote branches have diverged",
    ),
];

/// Maps known git failure output to a readable message. Unknown output is
/// reduced to its first line, truncated.
#[must_use]
pub fn summarize_pull_error(output: &str) -> String {
    let lower = output.to_lowercase();
    if let Some((_, message)) = KNOWN_FAILURES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| lower.contains(needle)))
    {
        return (*message).to_string();
    }

    let first_line = output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("git pull failed");
    truncate(first_line, MAX_ERROR_MESSAGE_LEN)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}
