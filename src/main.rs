use anyhow::Context;
use clap::Parser;
use gittyup::cli::Cli;
use gittyup::git::{self, Git};
use gittyup::log::{JsonLinesLog, LogSink, MemoryLog};
use gittyup::output;
use gittyup::repo::RepoState;
use gittyup::workspace::{self, CancelToken, RunContext};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let repos = repo_paths(&cli, &cwd)?;
    git::ensure_git_available(&config)?;

    let log: Arc<dyn LogSink> = match &cli.log_file {
        Some(path) => Arc::new(JsonLinesLog::create(path)?),
        None => Arc::new(MemoryLog::default()),
    };
    let ctx = RunContext::new(log);
    watch_for_interrupt(ctx.cancel.clone());

    output::print_working_dir(&cwd, &config);
    output::print_run_start(repos.len(), &config);

    let start = Instant::now();
    let progress = output::create_workspace_progress(repos.len(), &config);
    let results = workspace::update_workspace(
        &Git::new(&config),
        &repos,
        |name| progress.create_repo_tracker(name, config),
        &config,
        &ctx,
    )?;
    progress.finish();

    output::print_summary(&results, start.elapsed(), &config);

    // Drop the run context so a file log is flushed before exiting.
    drop(ctx);
    if results.iter().any(|r| r.status == RepoState::Failed) {
        std::process::exit(1);
    }
    Ok(())
}

fn repo_paths(cli: &Cli, cwd: &std::path::Path) -> anyhow::Result<Vec<PathBuf>> {
    if cli.paths.is_empty() {
        return Ok(vec![cwd.to_path_buf()]);
    }
    cli.paths
        .iter()
        .map(|path| {
            let path = cwd.join(path);
            anyhow::ensure!(path.is_dir(), "Not a directory: {}", path.display());
            Ok(path)
        })
        .collect()
}

/// Cancels the run on Ctrl-C. Updates already running are left to finish.
fn watch_for_interrupt(cancel: CancelToken) {
    std::thread::spawn(move || {
        let Ok(runtime) = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        else {
            return;
        };
        runtime.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                output::print_interrupted();
                cancel.cancel();
            }
            // A second Ctrl-C abandons the running updates.
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        });
    });
}
