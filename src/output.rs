//! Progress bars, colored output, and summary formatting.
//!
//! This module provides visual feedback during repository updates including
//! the workspace progress bar and the grouped summary printed at the end.

use crate::config::Config;
use crate::constants::{MAX_VISIBLE_COMPLETIONS, PROGRESS_TICK_MS};
use crate::repo::{RepoInfo, RepoState, UpdateCallbacks, UpdateStep};
use colored::{ColoredString, Colorize};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// No-op callbacks for when progress tracking is not needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCallbacks;

impl UpdateCallbacks for NoOpCallbacks {
    fn on_step(&self, _step: &UpdateStep) {}
    fn on_complete(&self, _repo: &RepoInfo) {}
}

/// Prints a repository header in verbose mode.
pub fn print_repo_header(config: &Config, repo_name: &str) {
    if !config.is_verbose() {
        return;
    }
    eprintln!("\n{}", format!("[{}]", repo_name).white().bold());
}

/// Prints a step progress message in verbose mode.
pub fn print_step(config: &Config, step: &UpdateStep) {
    if !config.is_verbose() {
        return;
    }
    eprintln!("  {}...", step.to_string().dimmed());
}

/// Prints the terminal state of one repository (verbose mode only).
pub fn print_completion_status(config: &Config, repo: &RepoInfo) {
    if !config.is_verbose() {
        return;
    }
    match &repo.message {
        Some(message) => eprintln!("  {} {}: {}", state_symbol(repo.status), repo.status, message),
        None => eprintln!("  {} {}", state_symbol(repo.status), repo.status),
    }
}

fn state_symbol(state: RepoState) -> ColoredString {
    match state {
        RepoState::Updated => "✓".green(),
        RepoState::UpToDate => "=".cyan(),
        RepoState::Skipped => "-".yellow(),
        RepoState::Failed => "✗".red(),
        RepoState::Pending => "?".dimmed(),
    }
}

/// Consolidated state for workspace progress tracking, behind one lock.
struct CompletionState {
    /// Recently completed repos for display (bounded by MAX_VISIBLE_COMPLETIONS)
    repos: VecDeque<(String, RepoState)>,
    skipped_count: usize,
    failed_count: usize,
    total_completed: usize,
}

/// Thread-safe progress tracker for workspace mode.
/// Shows a progress bar with the completion count and recent results.
#[derive(Clone)]
pub struct WorkspaceProgress {
    _multi: Arc<MultiProgress>,
    main_bar: ProgressBar,
    completion_slots: Vec<ProgressBar>,
    state: Arc<Mutex<CompletionState>>,
}

impl WorkspaceProgress {
    pub fn create_repo_tracker(&self, repo_name: &str, config: Config) -> RepoProgressTracker {
        RepoProgressTracker {
            repo_name: repo_name.to_string(),
            workspace: self.clone(),
            config,
        }
    }

    pub fn mark_completed(&self, repo_name: &str, status: RepoState) {
        self.main_bar.inc(1);

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        match status {
            RepoState::Skipped => state.skipped_count += 1,
            RepoState::Failed => state.failed_count += 1,
            _ => {}
        }
        if state.skipped_count > 0 || state.failed_count > 0 {
            self.main_bar.set_message(format!(
                "│ {} {}",
                format!("{} skipped", state.skipped_count).yellow(),
                format!("{} failed", state.failed_count).red()
            ));
        }

        state.total_completed += 1;
        state.repos.push_back((repo_name.to_string(), status));

        while state.repos.len() > MAX_VISIBLE_COMPLETIONS {
            state.repos.pop_front();
        }

        self.redraw_completions(&state);
    }

    pub fn finish(&self) {
        self.main_bar.finish_and_clear();
        for slot in &self.completion_slots {
            slot.finish_and_clear();
        }
    }

    fn redraw_completions(&self, state: &CompletionState) {
        let show_ellipsis = state.total_completed > MAX_VISIBLE_COMPLETIONS;

        for (i, slot) in self.completion_slots.iter().enumerate() {
            if i == 0 && show_ellipsis {
                slot.set_message("...".dimmed().to_string());
            } else {
                let idx = if show_ellipsis { i - 1 } else { i };
                if let Some((name, status)) = state.repos.get(idx) {
                    slot.set_message(format!("{} {}", state_symbol(*status), name));
                } else {
                    slot.set_message("");
                }
            }
        }
    }
}

/// Per-repository progress tracker for workspace mode.
#[derive(Clone)]
pub struct RepoProgressTracker {
    repo_name: String,
    workspace: WorkspaceProgress,
    config: Config,
}

impl UpdateCallbacks for RepoProgressTracker {
    fn on_update_start(&self, repo_name: &str) {
        print_repo_header(&self.config, repo_name);
    }

    fn on_step(&self, step: &UpdateStep) {
        print_step(&self.config, step);
    }

    fn on_complete(&self, repo: &RepoInfo) {
        print_completion_status(&self.config, repo);
        self.workspace.mark_completed(&self.repo_name, repo.status);
    }
}

/// Creates a progress bar for workspace updates showing completion count.
/// Returns hidden progress bars in quiet or verbose mode.
#[must_use]
pub fn create_workspace_progress(total: usize, config: &Config) -> WorkspaceProgress {
    let multi = Arc::new(MultiProgress::new());
    let hide_progress = config.is_quiet() || config.is_verbose();

    let main_bar = if hide_progress {
        ProgressBar::hidden()
    } else {
        let bar = multi.add(ProgressBar::new(total as u64));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos}/{len} done {spinner:.cyan} {msg}")
        {
            bar.set_style(style.progress_chars("█░"));
        }
        bar.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
        bar
    };

    let completion_slots: Vec<ProgressBar> = if hide_progress {
        vec![]
    } else {
        (0..MAX_VISIBLE_COMPLETIONS)
            .map(|_| {
                let slot = multi.add(ProgressBar::new_spinner());
                if let Ok(style) = ProgressStyle::default_spinner().template("  {msg}") {
                    slot.set_style(style);
                }
                slot
            })
            .collect()
    };

    WorkspaceProgress {
        _multi: multi,
        main_bar,
        completion_slots,
        state: Arc::new(Mutex::new(CompletionState {
            repos: VecDeque::new(),
            skipped_count: 0,
            failed_count: 0,
            total_completed: 0,
        })),
    }
}

pub fn print_working_dir(path: &Path, config: &Config) {
    if config.is_quiet() {
        return;
    }
    println!(
        "{} {}",
        "Working in:".cyan(),
        path.display().to_string().white().bold()
    )
}

pub fn print_run_start(count: usize, config: &Config) {
    if config.is_quiet() {
        return;
    }
    if count == 0 {
        println!("{}", "No git repositories to update".yellow().bold())
    } else {
        println!("{}", format!("Updating {} repositories", count).dimmed())
    }
}

pub fn print_interrupted() {
    eprintln!("{}", "Interrupted: finishing running updates, not starting new ones".yellow());
}

pub fn print_summary(results: &[RepoInfo], duration: Duration, config: &Config) {
    if config.is_quiet() {
        print_quiet_summary(results);
    } else {
        print_normal_summary(results, duration);
    }
}

fn print_quiet_summary(results: &[RepoInfo]) {
    let pulled = count(results, RepoState::Updated) + count(results, RepoState::UpToDate);

    // Always print count to stdout
    println!("{}/{} repositories up to date", pulled, results.len());

    // Print failures to stderr
    for repo in results.iter().filter(|r| r.status == RepoState::Failed) {
        eprintln!(
            "error: {}: {}",
            repo.path.display(),
            repo.message.as_deref().unwrap_or_default()
        );
    }
}

fn print_normal_summary(results: &[RepoInfo], duration: Duration) {
    print_section("Summary");

    print_group(results, RepoState::Updated, "Updated", "OK".green().bold());
    print_group(results, RepoState::UpToDate, "Already up to date", "==".cyan().bold());
    print_group(results, RepoState::Skipped, "Skipped", "SKIP".yellow().bold());
    print_group(results, RepoState::Failed, "Failed", "FAIL".red().bold());

    println!(
        "{}: {} updated, {} up to date, {} skipped, {} failed of {} repos in {}",
        "Total".white().bold(),
        count(results, RepoState::Updated),
        count(results, RepoState::UpToDate),
        count(results, RepoState::Skipped),
        count(results, RepoState::Failed),
        results.len(),
        format_duration(duration)
    );
}

fn count(results: &[RepoInfo], state: RepoState) -> usize {
    results.iter().filter(|r| r.status == state).count()
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f32())
}

fn print_section(title: &str) {
    let line = "=".repeat(50).cyan().dimmed();
    let padding = (50 - title.len()) / 2;
    let centered = format!("{:>width$}", title, width = padding + title.len());
    println!("\n{}\n{}\n{}\n", line, centered.cyan().bold(), line);
}

fn print_group(results: &[RepoInfo], state: RepoState, title: &str, tag: ColoredString) {
    let group: Vec<&RepoInfo> = results.iter().filter(|r| r.status == state).collect();
    if group.is_empty() {
        return;
    }

    let heading = format!("{} ({}):", title, group.len());
    let heading = match state {
        RepoState::Failed => heading.red().bold(),
        RepoState::Skipped => heading.yellow().bold(),
        _ => heading.green().bold(),
    };
    println!("{}", heading);

    for repo in group {
        println!("  {}", format_repo_line(repo, &tag));
    }
    println!();
}

fn format_repo_line(repo: &RepoInfo, tag: &ColoredString) -> String {
    let detail = match &repo.message {
        Some(message) => format!(" {}", message),
        None => String::new(),
    };
    format!(
        "{} {}{} in {}",
        tag,
        repo.path.display().to_string().white(),
        detail,
        format_duration(repo.duration).dimmed(),
    )
}
