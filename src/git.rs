//! Git command gateway.
//!
//! Every git invocation made by gittyup goes through [`VersionControl`].
//! The provided methods name the handful of commands the updater needs;
//! [`Git`] runs them as subprocesses, and tests substitute their own
//! implementation of the semantic methods.

use crate::config::Config;
use crate::error::GitError;
use anyhow::Context;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

/// Callback invoked before each git command runs.
pub type GitLogger = fn(&Path, &[&str]);

/// Echoes every git command to stderr.
pub fn verbose_logger(repo: &Path, args: &[&str]) {
    let name = repo
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    eprintln!("  [{}] $ git {}", name, args.join(" "));
}

pub fn no_op_logger(_repo: &Path, _args: &[&str]) {}

/// Captured result of a finished git process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, for diagnostics.
    #[must_use]
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, _) => self.stderr.trim_end().to_string(),
        }
    }

    /// Returns stdout, or `CommandFailed` if the process exited non-zero.
    pub fn require(self, command: &str) -> Result<String, GitError> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(GitError::CommandFailed {
                command: command.to_string(),
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Access to the version-control tool for a single working copy.
///
/// Only [`run`](VersionControl::run) is required. The other methods are the
/// exact commands the status inspectors, conflict predictor and pull
/// executor issue.
pub trait VersionControl {
    fn run(&self, repo: &Path, args: &[&str]) -> Result<CommandOutput, GitError>;

    fn current_branch(&self, repo: &Path) -> Result<CommandOutput, GitError> {
        self.run(repo, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn remotes(&self, repo: &Path) -> Result<CommandOutput, GitError> {
        self.run(repo, &["remote"])
    }

    fn upstream(&self, repo: &Path) -> Result<CommandOutput, GitError> {
        self.run(
            repo,
            &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{upstream}"],
        )
    }

    fn status_porcelain(&self, repo: &Path) -> Result<CommandOutput, GitError> {
        self.run(repo, &["status", "--porcelain", "-z"])
    }

    fn fetch(&self, repo: &Path) -> Result<CommandOutput, GitError> {
        self.run(repo, &["fetch"])
    }

    fn diff_name_status(
        &self,
        repo: &Path,
        from: &str,
        to: &str,
    ) -> Result<CommandOutput, GitError> {
        self.run(repo, &["diff", "--name-status", "-z", from, to])
    }

    fn pull(&self, repo: &Path) -> Result<CommandOutput, GitError> {
        self.run(repo, &["pull"])
    }
}

/// Runs git as a subprocess with a per-command timeout.
#[derive(Debug, Clone, Copy)]
pub struct Git {
    timeout: Duration,
    logger: GitLogger,
}

impl Git {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: config.timeout,
            logger: config.git_logger(),
        }
    }

    async fn run_with_deadline(
        &self,
        repo: &Path,
        args: &[&str],
        command: String,
    ) -> Result<CommandOutput, GitError> {
        let mut cmd = tokio::process::Command::new("git");
        cmd.current_dir(repo)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group: a terminal Ctrl-C must not kill a running pull.
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|source| GitError::Spawn {
            command: command.clone(),
            source,
        })?;

        // Dropping the output future on timeout kills the child and closes its pipes.
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(CommandOutput {
                // Killed by a signal: no exit code.
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(source)) => Err(GitError::Wait { command, source }),
            Err(_) => Err(GitError::Timeout {
                command,
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

impl VersionControl for Git {
    fn run(&self, repo: &Path, args: &[&str]) -> Result<CommandOutput, GitError> {
        (self.logger)(repo, args);
        let command = args.join(" ");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;
        runtime.block_on(self.run_with_deadline(repo, args, command))
    }
}

/// Runs a git command and returns its trimmed stdout, failing on non-zero exit.
pub fn run_git(repo: &Path, config: &Config, args: &[&str]) -> anyhow::Result<String> {
    let output = Git::new(config).run(repo, args)?;
    let stdout = output.require(&args.join(" "))?;
    Ok(stdout.trim().to_string())
}

/// Checks that `git` can be executed at all.
pub fn ensure_git_available(config: &Config) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    run_git(&cwd, config, &["--version"]).context("git is not installed or not on PATH")?;
    Ok(())
}
