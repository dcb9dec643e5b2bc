// Repository state, update steps and the per-repository update state machine

use crate::conflict;
use crate::constants::DEFAULT_REPO_NAME;
use crate::error::GitError;
use crate::git::VersionControl;
use crate::log::LogEntry;
use crate::pull::{self, PullOutcome};
use crate::status::{self, UncommittedEntry};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const NO_REMOTE: &str = "No remote configured";
const DETACHED_HEAD: &str = "Detached HEAD state";
const NO_UPSTREAM: &str = "No upstream branch configured";
const UNCOMMITTED_CHANGES: &str = "Repository has uncommitted changes";

/// Where a repository is in the update state machine.
///
/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoState {
    Pending,
    Updated,
    UpToDate,
    Skipped,
    Failed,
}

impl RepoState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }
}

impl fmt::Display for RepoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Pending => "pending",
            Self::Updated => "updated",
            Self::UpToDate => "up to date",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// How a repository left `Pending`. Skips and failures always carry a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Updated,
    UpToDate,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub path: PathBuf,
    pub name: String,
    pub status: RepoState,
    pub message: Option<String>,
    pub duration: Duration,
}

impl RepoInfo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = repo_name(&path).to_string();
        Self {
            path,
            name,
            status: RepoState::Pending,
            message: None,
            duration: Duration::ZERO,
        }
    }

    /// Moves the repository to its terminal state. Happens exactly once.
    pub fn resolve(&mut self, resolution: Resolution) {
        debug_assert!(
            !self.status.is_terminal(),
            "{} already resolved as {}",
            self.name,
            self.status
        );
        let (status, message) = match resolution {
            Resolution::Updated => (RepoState::Updated, None),
            Resolution::UpToDate => (RepoState::UpToDate, None),
            Resolution::Skipped(reason) => (RepoState::Skipped, Some(reason)),
            Resolution::Failed(error) => (RepoState::Failed, Some(error)),
        };
        self.status = status;
        self.message = message;
    }
}

/// Directory name of a repository, used for display and logs.
pub fn repo_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_REPO_NAME)
}

/// Dirty-repository policy for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    pub skip_dirty: bool,
    pub ignore_untracked: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            skip_dirty: true,
            ignore_untracked: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStep {
    Started,
    CheckingStatus,
    CheckingConflicts,
    Pulling,
    Completed,
}

impl fmt::Display for UpdateStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Started => "Starting update",
            Self::CheckingStatus => "Checking repository status",
            Self::CheckingConflicts => "Checking untracked files against incoming changes",
            Self::Pulling => "Pulling changes",
            Self::Completed => "Completed",
        };
        f.write_str(text)
    }
}

/// Progress notifications for a single repository update.
pub trait UpdateCallbacks {
    fn on_update_start(&self, _repo_name: &str) {}
    fn on_step(&self, step: &UpdateStep);
    fn on_complete(&self, repo: &RepoInfo);
}

/// What the state machine decided, plus the evidence that goes in the log.
struct Decision {
    resolution: Resolution,
    uncommitted_files: Vec<UncommittedEntry>,
    output: Option<String>,
}

impl Decision {
    fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            uncommitted_files: Vec::new(),
            output: None,
        }
    }
}

/// Drives one repository from `Pending` to a terminal state.
///
/// Never fails: every problem becomes a `Skipped` or `Failed` resolution
/// for this repository alone.
pub fn update_repository<V, C>(
    vcs: &V,
    mut repo: RepoInfo,
    options: UpdateOptions,
    callbacks: &C,
) -> (RepoInfo, LogEntry)
where
    V: VersionControl + ?Sized,
    C: UpdateCallbacks + ?Sized,
{
    let start = Instant::now();
    callbacks.on_update_start(&repo.name);
    callbacks.on_step(&UpdateStep::Started);

    let decision = match decide(vcs, &repo.path, options, callbacks) {
        Ok(decision) => decision,
        Err(e) => Decision::new(Resolution::Failed(e.to_string())),
    };

    callbacks.on_step(&UpdateStep::Completed);
    repo.resolve(decision.resolution);
    repo.duration = start.elapsed();

    let entry = LogEntry {
        uncommitted_files: decision.uncommitted_files,
        output: decision.output,
        ..LogEntry::from_repo(&repo)
    };

    callbacks.on_complete(&repo);
    (repo, entry)
}

fn decide<V, C>(
    vcs: &V,
    path: &Path,
    options: UpdateOptions,
    callbacks: &C,
) -> Result<Decision, GitError>
where
    V: VersionControl + ?Sized,
    C: UpdateCallbacks + ?Sized,
{
    callbacks.on_step(&UpdateStep::CheckingStatus);
    let repo_status = status::get_repo_status(vcs, path)?;

    if !repo_status.has_remote {
        return Ok(Decision::new(Resolution::Skipped(NO_REMOTE.to_string())));
    }
    if repo_status.is_detached {
        return Ok(Decision::new(Resolution::Skipped(DETACHED_HEAD.to_string())));
    }
    if !repo_status.has_upstream {
        return Ok(Decision::new(Resolution::Skipped(NO_UPSTREAM.to_string())));
    }

    if !repo_status.is_clean && options.skip_dirty {
        let entries = repo_status.uncommitted_files;

        if options.ignore_untracked && status::has_only_untracked_files(&entries) {
            callbacks.on_step(&UpdateStep::CheckingConflicts);
            let verdict = conflict::check_for_pull_conflicts(vcs, path);
            if !verdict.is_safe {
                let reason = verdict
                    .reason
                    .unwrap_or_else(|| "Pull would overwrite untracked files".to_string());
                return Ok(Decision {
                    resolution: Resolution::Skipped(reason),
                    uncommitted_files: entries,
                    output: None,
                });
            }
        } else {
            return Ok(Decision {
                resolution: Resolution::Skipped(UNCOMMITTED_CHANGES.to_string()),
                uncommitted_files: entries,
                output: None,
            });
        }
    }

    callbacks.on_step(&UpdateStep::Pulling);
    let outcome = pull::pull_repository(vcs, path)?;
    Ok(Decision {
        resolution: resolve_pull(&outcome),
        uncommitted_files: Vec::new(),
        output: Some(outcome.full_output),
    })
}

fn resolve_pull(outcome: &PullOutcome) -> Resolution {
    if outcome.already_up_to_date {
        Resolution::UpToDate
    } else if outcome.success {
        Resolution::Updated
    } else {
        Resolution::Failed(outcome.error_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_repo_is_pending_and_named_after_directory() {
        let repo = RepoInfo::new("/work/src/billing-api");
        assert_eq!(repo.status, RepoState::Pending);
        assert_eq!(repo.name, "billing-api");
        assert!(repo.message.is_none());
    }

    #[test]
    fn test_repo_name_falls_back_for_root() {
        assert_eq!(repo_name(Path::new("/")), DEFAULT_REPO_NAME);
    }

    #[test]
    fn test_resolve_skipped_keeps_reason() {
        let mut repo = RepoInfo::new("/work/a");
        repo.resolve(Resolution::Skipped(NO_REMOTE.to_string()));
        assert_eq!(repo.status, RepoState::Skipped);
        assert_eq!(repo.message.as_deref(), Some(NO_REMOTE));
    }

    #[test]
    #[should_panic(expected = "already resolved")]
    #[cfg(debug_assertions)]
    fn test_resolve_twice_is_a_logic_error() {
        let mut repo = RepoInfo::new("/work/a");
        repo.resolve(Resolution::Updated);
        repo.resolve(Resolution::Failed("again".to_string()));
    }

    #[test]
    fn test_resolve_pull_prefers_up_to_date() {
        let outcome = PullOutcome {
            success: true,
            already_up_to_date: true,
            full_output: "Already up to date.".to_string(),
        };
        assert_eq!(resolve_pull(&outcome), Resolution::UpToDate);

        let failed = PullOutcome {
            success: false,
            already_up_to_date: false,
            full_output: "fatal: could not resolve host: example.com".to_string(),
        };
        match resolve_pull(&failed) {
            Resolution::Failed(message) => assert!(message.contains("Network")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_state_display_and_terminality() {
        assert_eq!(RepoState::UpToDate.to_string(), "up to date");
        assert!(!RepoState::Pending.is_terminal());
        assert!(RepoState::Failed.is_terminal());
    }
}
