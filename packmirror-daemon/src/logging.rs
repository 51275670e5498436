//! The process log sink.
//!
//! [`LogSink`] owns the `tracing` dispatcher that writes to
//! `<home>/.packmirror/logs/app.log` (and optionally stderr). It is built once
//! by the binary and handed to whatever needs it; nothing here installs a
//! global default subscriber.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{dispatcher, Dispatch};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{io_err, DaemonError};
use crate::log_rotation;
use crate::paths::{app_log_path, logs_dir};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Also write every line to stderr (interactive launches).
    pub echo_stderr: bool,
    /// One JSON object per line instead of the plain text format.
    pub json: bool,
}

#[derive(Clone)]
pub struct LogSink {
    dispatch: Dispatch,
    path: PathBuf,
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink").field("path", &self.path).finish()
    }
}

impl LogSink {
    /// Rotate and open `app.log` under `home`. Failing to open the file is
    /// the one fatal startup error.
    pub fn open_at(home: &Path, options: LogOptions) -> Result<Self, DaemonError> {
        let dir = logs_dir(home);
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

        let path = app_log_path(home);
        let rotation = log_rotation::rotate_app_log(home);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| io_err(&path, e))?;
        let file = Arc::new(file);
        let writer = if options.echo_stderr {
            BoxMakeWriter::new(file.and(std::io::stderr))
        } else {
            BoxMakeWriter::new(file)
        };

        let sink = Self {
            dispatch: build_dispatch(writer, options.json),
            path,
        };

        sink.scope(|| match rotation {
            Ok(true) => tracing::info!(path = %sink.path.display(), "log file rotated"),
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(path = %sink.path.display(), error = %err, "log rotation failed")
            }
        });
        Ok(sink)
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` with this sink as the current dispatcher.
    pub fn scope<R>(&self, f: impl FnOnce() -> R) -> R {
        dispatcher::with_default(&self.dispatch, f)
    }
}

fn build_dispatch(writer: BoxMakeWriter, json: bool) -> Dispatch {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer);
    if json {
        Dispatch::new(builder.json().finish())
    } else {
        Dispatch::new(builder.finish())
    }
}
