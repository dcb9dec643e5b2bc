//! Parallel updates across many repositories.
//!
//! Each repository is driven through [`repo::update_repository`] by one rayon
//! worker from start to finish. Workers share only the immutable inputs and
//! the run's [`RunContext`].

use crate::config::Config;
use crate::git::VersionControl;
use crate::log::{LogEntry, LogSink};
use crate::repo::{self, RepoInfo, Resolution, UpdateCallbacks};
use anyhow::Context;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const CANCELLED: &str = "Update cancelled before it started";

/// Run-wide cancellation flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handles scoped to a single run.
#[derive(Clone)]
pub struct RunContext {
    pub log: Arc<dyn LogSink>,
    pub cancel: CancelToken,
}

impl RunContext {
    pub fn new(log: Arc<dyn LogSink>) -> Self {
        Self {
            log,
            cancel: CancelToken::new(),
        }
    }
}

/// Updates every repository in `repos`, at most `config.worker_count()` at a time.
///
/// Results come back in input order, one per distinct repository. Once
/// `ctx.cancel` is set no further repository is started; those not started
/// are reported as skipped.
pub fn update_workspace<V, C, F>(
    vcs: &V,
    repos: &[PathBuf],
    make_callbacks: F,
    config: &Config,
    ctx: &RunContext,
) -> anyhow::Result<Vec<RepoInfo>>
where
    V: VersionControl + Sync + ?Sized,
    C: UpdateCallbacks,
    F: Fn(&str) -> C + Sync,
{
    let repos = dedup_repos(repos);
    let options = config.update_options();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_count())
        .build()
        .context("Failed to create worker thread pool")?;

    let results = pool.install(|| {
        repos
            .par_iter()
            .map(|path| {
                let info = RepoInfo::new(path.clone());
                let callbacks = make_callbacks(&info.name);

                let (info, entry) = if ctx.cancel.is_cancelled() {
                    cancelled(info, &callbacks)
                } else {
                    repo::update_repository(vcs, info, options, &callbacks)
                };

                ctx.log.record(entry);
                info
            })
            .collect()
    });

    Ok(results)
}

fn cancelled<C: UpdateCallbacks>(mut info: RepoInfo, callbacks: &C) -> (RepoInfo, LogEntry) {
    info.resolve(Resolution::Skipped(CANCELLED.to_string()));
    let entry = LogEntry::from_repo(&info);
    callbacks.on_complete(&info);
    (info, entry)
}

/// Drops repeated paths so no working copy is updated by two workers.
fn dedup_repos(repos: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    repos
        .iter()
        .filter(|path| {
            let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            seen.insert(key)
        })
        .cloned()
        .collect()
}
