use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the controller boundary, log sink and autostart management.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] packmirror_core::ConfigError),

    #[error("autostart error: {0}")]
    Autostart(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
