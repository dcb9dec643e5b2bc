//! Status inspectors and the untracked-only classifier.
//!
//! These functions derive facts about a working copy from git's own
//! output: the current branch, whether it can be pulled at all, and which
//! paths are uncommitted.

use crate::constants::{ALWAYS_IGNORED_FILES, DETACHED_HEAD};
use crate::error::GitError;
use crate::git::VersionControl;
use serde::Serialize;
use std::path::Path;

/// One line of `git status --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UncommittedEntry {
    pub path: String,
    /// Index state followed by worktree state, e.g. `" M"` or `"??"`.
    pub status_code: String,
    pub label: String,
}

impl UncommittedEntry {
    pub fn new(path: impl Into<String>, status_code: impl Into<String>) -> Self {
        let status_code = status_code.into();
        Self {
            path: path.into(),
            label: status_label(&status_code).to_string(),
            status_code,
        }
    }

    #[must_use]
    pub fn is_untracked(&self) -> bool {
        is_untracked_code(&self.status_code)
    }
}

/// Summary of the prerequisites for pulling a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStatus {
    pub has_remote: bool,
    pub is_clean: bool,
    pub is_detached: bool,
    pub has_upstream: bool,
    /// The status snapshot `is_clean` was computed from.
    pub uncommitted_files: Vec<UncommittedEntry>,
}

/// Accepts both the full `??` marker and the shortened `?` form.
#[must_use]
pub fn is_untracked_code(code: &str) -> bool {
    matches!(code, "??" | "?")
}

#[must_use]
pub fn status_label(code: &str) -> &'static str {
    match code {
        "??" | "?" => "Untracked",
        "M " | "M" => "Modified",
        " M" => "Modified (unstaged)",
        "MM" => "Modified (staged and unstaged)",
        "A " | "A" => "Added",
        "AM" => "Added (modified)",
        "D " | "D" => "Deleted",
        " D" => "Deleted (unstaged)",
        "R " | "R" | "RM" => "Renamed",
        "C " | "C" => "Copied",
        "UU" | "AA" | "DD" | "AU" | "UA" | "DU" | "UD" => "Conflict",
        _ => "Changed",
    }
}

/// True if any component of `path` is one of [`ALWAYS_IGNORED_FILES`].
#[must_use]
pub fn should_ignore_file(path: &str) -> bool {
    path.split('/')
        .any(|component| ALWAYS_IGNORED_FILES.contains(&component))
}

/// True iff every entry that is not always-ignored is untracked.
///
/// An empty list is vacuously untracked-only.
#[must_use]
pub fn has_only_untracked_files(entries: &[UncommittedEntry]) -> bool {
    entries
        .iter()
        .filter(|entry| !should_ignore_file(&entry.path))
        .all(UncommittedEntry::is_untracked)
}

/// Parses `git status --porcelain -z` output.
///
/// Records are NUL-terminated and paths are never quoted. A rename or copy
/// record is followed by one more field holding the original path, which is
/// dropped. Malformed records are skipped.
#[must_use]
pub fn parse_porcelain(output: &str) -> Vec<UncommittedEntry> {
    let mut entries = Vec::new();
    let mut fields = output.split('\0');
    while let Some(record) = fields.next() {
        let (Some(code), Some(path)) = (record.get(..2), record.get(3..)) else {
            continue;
        };
        if code.contains(['R', 'C']) {
            fields.next();
        }
        if !path.is_empty() {
            entries.push(UncommittedEntry::new(path, code));
        }
    }
    entries
}

/// Returns the checked-out branch, or `None` when HEAD is detached.
pub fn get_current_branch<V>(vcs: &V, repo: &Path) -> Result<Option<String>, GitError>
where
    V: VersionControl + ?Sized,
{
    let stdout = vcs
        .current_branch(repo)?
        .require("rev-parse --abbrev-ref HEAD")?;
    let branch = stdout.trim();
    if branch.is_empty() || branch == DETACHED_HEAD {
        Ok(None)
    } else {
        Ok(Some(branch.to_string()))
    }
}

pub fn get_uncommitted_files<V>(vcs: &V, repo: &Path) -> Result<Vec<UncommittedEntry>, GitError>
where
    V: VersionControl + ?Sized,
{
    let stdout = vcs.status_porcelain(repo)?.require("status --porcelain")?;
    Ok(parse_porcelain(&stdout))
}

pub fn get_repo_status<V>(vcs: &V, repo: &Path) -> Result<RepoStatus, GitError>
where
    V: VersionControl + ?Sized,
{
    let remotes = vcs.remotes(repo)?.require("remote")?;
    let has_remote = remotes.lines().any(|line| !line.trim().is_empty());

    let is_detached = get_current_branch(vcs, repo)?.is_none();

    let has_upstream = !is_detached && {
        let upstream = vcs.upstream(repo)?;
        upstream.success() && !upstream.stdout.trim().is_empty()
    };

    let uncommitted_files = get_uncommitted_files(vcs, repo)?;
    let is_clean = uncommitted_files
        .iter()
        .all(|entry| should_ignore_file(&entry.path));

    Ok(RepoStatus {
        has_remote,
        is_clean,
        is_detached,
        has_upstream,
        uncommitted_files,
    })
}
