//! Error types for packmirror-sync.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of a single traversal step or a single file copy.
///
/// None of these abort a mirror: they are logged and counted in the
/// [`MirrorReport`](crate::MirrorReport).
#[derive(Debug, Error)]
pub enum SyncError {
    /// A source directory could not be listed; its subtree is skipped.
    #[error("cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open source file {path}: {source}")]
    OpenSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create destination file {path}: {source}")]
    CreateDest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("copy {from} -> {to} failed: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot sync {path} to disk: {source}")]
    Sync {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A copy or traversal task panicked or was cancelled.
    #[error("{task} task join failure: {message}")]
    Join { task: &'static str, message: String },
}
