pub mod autostart;
pub mod check;
pub mod config;
pub mod logs;
pub mod mirror;
pub mod run;
pub mod setup;

use std::path::PathBuf;

use anyhow::{Context, Result};
use packmirror_core::{config as app_config, AppConfig, ConfigError};
use packmirror_daemon::{LogOptions, LogSink};

pub(crate) fn home() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

/// Open app.log for a one-shot command: file only, no stderr echo.
pub(crate) fn quiet_sink(home: &std::path::Path, json: bool) -> Result<LogSink> {
    LogSink::open_at(
        home,
        LogOptions {
            echo_stderr: false,
            json,
        },
    )
    .context("failed to open app.log")
}

/// Load config.json, pointing at `packmirror setup` when it is missing.
pub(crate) fn load_config(home: &std::path::Path) -> Result<AppConfig> {
    match app_config::load_at(home) {
        Ok(config) => Ok(config),
        Err(err @ ConfigError::ConfigNotFound { .. }) => {
            Err(err).context("no configuration yet; run `packmirror setup` first")
        }
        Err(err) => Err(err).context("failed to load configuration"),
    }
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")
}
