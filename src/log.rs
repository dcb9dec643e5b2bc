//! Per-repository run log.
//!
//! The orchestrator produces exactly one [`LogEntry`] per repository and
//! hands it to the [`LogSink`] of the current run.

use crate::repo::{RepoInfo, RepoState};
use crate::status::UncommittedEntry;
use anyhow::Context;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub repo_name: String,
    pub path: PathBuf,
    pub status: RepoState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Uncommitted entries that caused a skip.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uncommitted_files: Vec<UncommittedEntry>,
    /// Complete output of the pull, when one ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub duration_ms: u64,
}

impl LogEntry {
    /// An entry mirroring the repository's terminal state.
    #[must_use]
    pub fn from_repo(repo: &RepoInfo) -> Self {
        Self {
            repo_name: repo.name.clone(),
            path: repo.path.clone(),
            status: repo.status,
            message: repo.message.clone(),
            uncommitted_files: Vec::new(),
            output: None,
            duration_ms: u64::try_from(repo.duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Destination for log entries, shared by all workers of a run.
pub trait LogSink: Send + Sync {
    fn record(&self, entry: LogEntry);
}

/// Keeps entries in memory, in completion order.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLog {
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        lock(&self.entries).clone()
    }
}

impl LogSink for MemoryLog {
    fn record(&self, entry: LogEntry) {
        lock(&self.entries).push(entry);
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonLinesLog {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesLog {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn flush(&self) -> anyhow::Result<()> {
        lock(&self.writer)
            .flush()
            .with_context(|| format!("Failed to flush log file {}", self.path.display()))
    }
}

impl LogSink for JsonLinesLog {
    fn record(&self, entry: LogEntry) {
        let mut writer = lock(&self.writer);
        // A log write failure must not change the repository's outcome.
        let written = serde_json::to_writer(&mut *writer, &entry)
            .map_err(std::io::Error::from)
            .and_then(|()| writer.write_all(b"\n"));
        if let Err(e) = written {
            eprintln!(
                "warning: could not write log entry to {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

impl Drop for JsonLinesLog {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

// A poisoned lock still holds complete entries.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
