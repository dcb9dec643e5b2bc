//! Conflict prediction for untracked files.
//!
//! Git refuses a merge that would overwrite an untracked file only after the
//! pull has started, and some integrations overwrite it outright. Before
//! pulling a repository whose only changes are untracked files, the updater
//! fetches, diffs `HEAD` against the upstream ref and checks whether any
//! incoming path is one of those files.

use crate::git::VersionControl;
use crate::status::{self, UncommittedEntry};
use std::collections::BTreeSet;
use std::path::Path;

/// Verdict of [`check_for_pull_conflicts`]. `reason` is set iff unsafe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictResult {
    pub is_safe: bool,
    pub reason: Option<String>,
}

impl ConflictResult {
    #[must_use]
    pub fn safe() -> Self {
        Self {
            is_safe: true,
            reason: None,
        }
    }

    pub fn unsafe_because(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        debug_assert!(!reason.is_empty(), "unsafe verdict needs a reason");
        Self {
            is_safe: false,
            reason: Some(reason),
        }
    }
}

/// Predicts whether pulling `repo` would overwrite an untracked file.
///
/// Any step that cannot complete makes the verdict unsafe, with the
/// underlying error text in the reason.
pub fn check_for_pull_conflicts<V>(vcs: &V, repo: &Path) -> ConflictResult
where
    V: VersionControl + ?Sized,
{
    match status::get_current_branch(vcs, repo) {
        Ok(Some(_)) => {}
        Ok(None) => return ConflictResult::unsafe_because("Detached HEAD state"),
        Err(e) => {
            return ConflictResult::unsafe_because(format!(
                "Failed to determine current branch: {}",
                e
            ));
        }
    }

    match vcs.fetch(repo) {
        Ok(output) if output.success() => {}
        Ok(output) => {
            return ConflictResult::unsafe_because(format!(
                "Failed to fetch from remote: {}",
                output.stderr.trim()
            ));
        }
        Err(e) => {
            return ConflictResult::unsafe_because(format!("Failed to fetch from remote: {}", e));
        }
    }

    let upstream = match vcs.upstream(repo) {
        Ok(output) if output.success() && !output.stdout.trim().is_empty() => {
            output.stdout.trim().to_string()
        }
        Ok(output) => {
            return ConflictResult::unsafe_because(format!(
                "No upstream branch configured: {}",
                output.stderr.trim()
            ));
        }
        Err(e) => {
            return ConflictResult::unsafe_because(format!(
                "Failed to resolve upstream branch: {}",
                e
            ));
        }
    };

    let diff = match vcs.diff_name_status(repo, "HEAD", &upstream) {
        Ok(output) if output.success() => output.stdout,
        Ok(output) => {
            return ConflictResult::unsafe_because(format!(
                "Failed to compare HEAD with {}: {}",
                upstream,
                output.stderr.trim()
            ));
        }
        Err(e) => {
            return ConflictResult::unsafe_because(format!(
                "Failed to compare HEAD with {}: {}",
                upstream, e
            ));
        }
    };

    let incoming = parse_name_status(&diff);
    if incoming.is_empty() {
        return ConflictResult::safe();
    }

    let entries = match status::get_uncommitted_files(vcs, repo) {
        Ok(entries) => entries,
        Err(e) => {
            return ConflictResult::unsafe_because(format!(
                "Failed to list untracked files: {}",
                e
            ));
        }
    };

    let overwritten = overwritten_paths(&entries, &incoming);
    if overwritten.is_empty() {
        ConflictResult::safe()
    } else {
        ConflictResult::unsafe_because(format!(
            "Untracked files would be overwritten by pull: {}",
            overwritten.join(", ")
        ))
    }
}

/// Collects the paths of a `git diff --name-status -z` report.
///
/// Each record is a status field followed by one path, or by two for
/// renames and copies (`R100`, `C75`). Both sides of a rename are kept.
#[must_use]
pub fn parse_name_status(diff: &str) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    let mut fields = diff.split('\0').filter(|field| !field.is_empty());
    while let Some(status) = fields.next() {
        let count = if status.starts_with(['R', 'C']) { 2 } else { 1 };
        paths.extend(fields.by_ref().take(count).map(str::to_string));
    }
    paths
}

/// Untracked entries that an incoming path would replace, sorted.
///
/// An untracked directory (`dir/`) is hit by any incoming path below it.
fn overwritten_paths(entries: &[UncommittedEntry], incoming: &BTreeSet<String>) -> Vec<String> {
    let mut hits = BTreeSet::new();
    for entry in entries.iter().filter(|e| e.is_untracked()) {
        if entry.path.ends_with('/') {
            hits.extend(
                incoming
                    .iter()
                    .filter(|path| path.starts_with(entry.path.as_str()))
                    .cloned(),
            );
        } else if incoming.contains(&entry.path) {
            hits.insert(entry.path.clone());
        }
    }
    hits.into_iter().collect()
}
