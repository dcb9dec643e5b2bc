//! Test infrastructure for gittyup integration tests.
#![allow(dead_code)]

use anyhow::Result;
use gittyup::config::Config;
use gittyup::error::GitError;
use gittyup::git::{CommandOutput, VersionControl, run_git};
use gittyup::repo::{RepoInfo, UpdateCallbacks, UpdateStep};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub fn test_config() -> Config {
    Config {
        jobs: 4,
        timeout: Duration::from_secs(30),
        ..Config::default()
    }
}

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn failed(stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code: 1,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// Scripted reply for one fake git operation.
#[derive(Debug, Clone)]
pub enum Reply {
    Output(CommandOutput),
    TimedOut,
}

impl Reply {
    fn produce(&self, command: &str) -> Result<CommandOutput, GitError> {
        match self {
            Reply::Output(output) => Ok(output.clone()),
            Reply::TimedOut => Err(GitError::Timeout {
                command: command.to_string(),
                secs: 60,
            }),
        }
    }
}

/// A version-control double with one scripted reply per operation.
///
/// Records the name of every operation it is asked to perform.
#[derive(Debug)]
pub struct FakeVcs {
    pub branch: Reply,
    pub remotes: Reply,
    pub upstream: Reply,
    pub status: Reply,
    pub fetch: Reply,
    pub diff: Reply,
    pub pull: Reply,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeVcs {
    /// A clean repository on `main` tracking `origin/main`, with one incoming commit.
    pub fn healthy() -> Self {
        Self {
            branch: Reply::Output(ok("main\n")),
            remotes: Reply::Output(ok("origin\n")),
            upstream: Reply::Output(ok("origin/main\n")),
            status: Reply::Output(ok("")),
            fetch: Reply::Output(ok("")),
            diff: Reply::Output(ok("")),
            pull: Reply::Output(ok("Updating 1a2b3c4..5d6e7f8\nFast-forward\n README.md | 2 +-\n")),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `porcelain` is in `git status --porcelain -z` form.
    pub fn with_status(mut self, porcelain: &str) -> Self {
        self.status = Reply::Output(ok(porcelain));
        self
    }

    /// `name_status` is in `git diff --name-status -z` form.
    pub fn with_diff(mut self, name_status: &str) -> Self {
        self.diff = Reply::Output(ok(name_status));
        self
    }

    pub fn with_branch(mut self, branch: Reply) -> Self {
        self.branch = branch;
        self
    }

    pub fn with_remotes(mut self, remotes: &str) -> Self {
        self.remotes = Reply::Output(ok(remotes));
        self
    }

    pub fn with_upstream(mut self, upstream: Reply) -> Self {
        self.upstream = upstream;
        self
    }

    pub fn with_fetch(mut self, fetch: Reply) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_pull(mut self, pull: Reply) -> Self {
        self.pull = pull;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, op: &str) -> bool {
        self.calls().contains(&op)
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls().iter().filter(|call| **call == op).count()
    }

    fn record(&self, op: &'static str) {
        self.calls.lock().unwrap().push(op);
    }
}

impl VersionControl for FakeVcs {
    fn run(&self, _repo: &Path, args: &[&str]) -> Result<CommandOutput, GitError> {
        self.record("run");
        Ok(failed(&format!("unexpected git {}", args.join(" "))))
    }

    fn current_branch(&self, _repo: &Path) -> Result<CommandOutput, GitError> {
        self.record("current_branch");
        self.branch.produce("rev-parse --abbrev-ref HEAD")
    }

    fn remotes(&self, _repo: &Path) -> Result<CommandOutput, GitError> {
        self.record("remotes");
        self.remotes.produce("remote")
    }

    fn upstream(&self, _repo: &Path) -> Result<CommandOutput, GitError> {
        self.record("upstream");
        self.upstream.produce("rev-parse @{upstream}")
    }

    fn status_porcelain(&self, _repo: &Path) -> Result<CommandOutput, GitError> {
        self.record("status");
        self.status.produce("status --porcelain")
    }

    fn fetch(&self, _repo: &Path) -> Result<CommandOutput, GitError> {
        self.record("fetch");
        self.fetch.produce("fetch")
    }

    fn diff_name_status(
        &self,
        _repo: &Path,
        _from: &str,
        _to: &str,
    ) -> Result<CommandOutput, GitError> {
        self.record("diff");
        self.diff.produce("diff --name-status")
    }

    fn pull(&self, _repo: &Path) -> Result<CommandOutput, GitError> {
        self.record("pull");
        self.pull.produce("pull")
    }
}

/// A temporary git repository for testing.
/// Automatically cleaned up when dropped.
pub struct TestRepo {
    _temp_dir: TempDir,
    path: PathBuf,
    remote: Option<PathBuf>,
}

impl TestRepo {
    /// Creates a new test repository with an initial commit on the master branch.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("local");
        std::fs::create_dir_all(&path)?;
        init_repo(&path, "master")?;

        Ok(Self {
            _temp_dir: temp_dir,
            path,
            remote: None,
        })
    }

    /// Creates a test repository whose master branch tracks a bare remote.
    pub fn with_remote() -> Result<Self> {
        let mut repo = Self::new()?;
        let config = test_config();
        let remote = repo._temp_dir.path().join("remote.git");
        std::fs::create_dir_all(&remote)?;
        run_git(&remote, &config, &["init", "--bare"])?;

        run_git(
            &repo.path,
            &config,
            &["remote", "add", "origin", path_str(&remote)?],
        )?;
        run_git(&repo.path, &config, &["push", "-u", "origin", "master"])?;
        repo.remote = Some(remote);
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pushes a commit adding `file` to the remote from a second clone.
    pub fn push_upstream_commit(&self, file: &str, contents: &str) -> Result<()> {
        let config = test_config();
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("repository has no remote"))?;
        let other = self._temp_dir.path().join("other");
        if !other.exists() {
            run_git(
                self._temp_dir.path(),
                &config,
                &["clone", path_str(remote)?, "other"],
            )?;
            configure_identity(&other)?;
        }
        run_git(&other, &config, &["pull"])?;
        std::fs::write(other.join(file), contents)?;
        run_git(&other, &config, &["add", file])?;
        run_git(&other, &config, &["commit", "-m", &format!("Add {}", file)])?;
        run_git(&other, &config, &["push"])?;
        Ok(())
    }

    pub fn write_file(&self, file: &str, contents: &str) -> Result<()> {
        std::fs::write(self.path.join(file), contents)?;
        Ok(())
    }

    pub fn make_dirty(&self) -> Result<()> {
        self.write_file("README.md", "# Modified\n")
    }

    pub fn make_untracked(&self) -> Result<()> {
        self.write_file("untracked.txt", "untracked content\n")
    }

    pub fn file_contents(&self, file: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.path.join(file))?)
    }

    pub fn file_exists(&self, file: &str) -> bool {
        self.path.join(file).exists()
    }
}

pub fn init_repo(path: &Path, branch: &str) -> Result<()> {
    let config = test_config();
    run_git(path, &config, &["init", "-b", branch])?;
    configure_identity(path)?;
    std::fs::write(path.join("README.md"), "# Test Repo\n")?;
    run_git(path, &config, &["add", "README.md"])?;
    run_git(path, &config, &["commit", "-m", "Initial commit"])?;
    Ok(())
}

fn configure_identity(path: &Path) -> Result<()> {
    let config = test_config();
    run_git(path, &config, &["config", "user.email", "test@example.com"])?;
    run_git(path, &config, &["config", "user.name", "Test User"])?;
    run_git(path, &config, &["config", "pull.rebase", "false"])?;
    Ok(())
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow::anyhow!("non UTF-8 path: {}", path.display()))
}

/// Callbacks that count steps and completions across clones.
#[derive(Clone, Default)]
pub struct CountingCallbacks {
    pub steps: Arc<AtomicUsize>,
    pub completed: Arc<AtomicUsize>,
    pub seen: Arc<Mutex<Vec<UpdateStep>>>,
}

impl UpdateCallbacks for CountingCallbacks {
    fn on_step(&self, step: &UpdateStep) {
        self.steps.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(*step);
    }

    fn on_complete(&self, _repo: &RepoInfo) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}
