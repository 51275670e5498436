//! Tree mirror: walk, fan out, join.
//!
//! The walk runs on a blocking thread and streams [`CopyJob`]s through a
//! bounded channel. Each job becomes a blocking task in a [`JoinSet`] owned by
//! this call; at most [`MirrorOptions::max_in_flight`] run at once. `mirror`
//! returns only after the walk has finished and the set is drained, so
//! callers that await pairs one after another never interleave them.

use std::path::{Path, PathBuf};
use std::time::Instant;

use packmirror_core::types::{MirrorPair, PairLabel};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::blocking::{spawn_traced, traced};
use crate::copy::{copy_file, CopyJob};
use crate::error::SyncError;
use crate::walk::TreeWalk;

pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorOptions {
    /// Upper bound on concurrently running file copies. Throttles only; every
    /// job still runs.
    pub max_in_flight: usize,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Outcome of one mirror call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<PairLabel>,
    pub source: PathBuf,
    pub dest: PathBuf,
    pub files_copied: usize,
    pub bytes_copied: u64,
    pub files_failed: usize,
    pub traversal_errors: usize,
    pub duration_ms: u64,
}

impl MirrorReport {
    fn new(source: &Path, dest: &Path) -> Self {
        Self {
            label: None,
            source: source.to_path_buf(),
            dest: dest.to_path_buf(),
            files_copied: 0,
            bytes_copied: 0,
            files_failed: 0,
            traversal_errors: 0,
            duration_ms: 0,
        }
    }

    /// True when nothing failed, including the trivial empty-tree case.
    pub fn is_clean(&self) -> bool {
        self.files_failed == 0 && self.traversal_errors == 0
    }

    fn record(&mut self, outcome: Result<(CopyJob, Result<u64, SyncError>), JoinError>) {
        match outcome {
            Ok((_, Ok(bytes))) => {
                self.files_copied += 1;
                self.bytes_copied += bytes;
            }
            Ok((job, Err(err))) => {
                tracing::warn!(
                    from = %job.source.display(),
                    to = %job.dest.display(),
                    error = %err,
                    "file copy failed",
                );
                self.files_failed += 1;
            }
            Err(err) => {
                let err = SyncError::Join {
                    task: "file copy",
                    message: err.to_string(),
                };
                tracing::error!(error = %err, "file copy task failed");
                self.files_failed += 1;
            }
        }
    }
}

/// Mirror every file under `source_root` onto `dest_root`, overwriting
/// existing files. Never fails as a whole: traversal and per-file errors are
/// logged and counted in the report.
pub async fn mirror(source_root: &Path, dest_root: &Path, options: &MirrorOptions) -> MirrorReport {
    let started = Instant::now();
    let mut report = MirrorReport::new(source_root, dest_root);
    let max_in_flight = options.max_in_flight.max(1);

    let (job_tx, mut job_rx) = mpsc::channel::<Result<CopyJob, SyncError>>(max_in_flight);
    let walk = TreeWalk::new(source_root, dest_root);
    let walker = spawn_traced(move || {
        for item in walk {
            if job_tx.blocking_send(item).is_err() {
                break;
            }
        }
    });

    let mut copies = JoinSet::new();
    while let Some(item) = job_rx.recv().await {
        let job = match item {
            Ok(job) => job,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable directory");
                report.traversal_errors += 1;
                continue;
            }
        };
        while copies.len() >= max_in_flight {
            match copies.join_next().await {
                Some(outcome) => report.record(outcome),
                None => break,
            }
        }
        copies.spawn_blocking(traced(move || {
            let result = copy_file(&job);
            (job, result)
        }));
    }

    if let Err(err) = walker.await {
        let err = SyncError::Join {
            task: "tree walk",
            message: err.to_string(),
        };
        tracing::error!(error = %err, "tree walk task failed");
        report.traversal_errors += 1;
    }

    while let Some(outcome) = copies.join_next().await {
        report.record(outcome);
    }

    report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    report
}

/// [`mirror`] for a configured pair, logging the summary.
pub async fn mirror_pair(pair: &MirrorPair, options: &MirrorOptions) -> MirrorReport {
    tracing::info!(
        pair = %pair.label,
        source = %pair.source_root.display(),
        dest = %pair.dest_root.display(),
        "mirroring",
    );
    let mut report = mirror(&pair.source_root, &pair.dest_root, options).await;
    report.label = Some(pair.label);
    tracing::info!(
        pair = %pair.label,
        copied = report.files_copied,
        bytes = report.bytes_copied,
        failed = report.files_failed,
        traversal_errors = report.traversal_errors,
        duration_ms = report.duration_ms,
        "mirror completed",
    );
    report
}
