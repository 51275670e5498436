//! `packmirror run [--autostart] [--detach]`: the copy loop.

use std::io;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tokio::sync::broadcast;
use tracing::instrument::WithSubscriber;

use packmirror_core::config as app_config;
use packmirror_daemon::paths::STARTUP_NOTICE_DELAY;
use packmirror_daemon::{spawn_detached, CopyCycleController, CycleConfig, LogOptions, LogSink};
use packmirror_detector::platform_observer;

use super::{home, runtime, setup::setup_interactive};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Launched at login: no prompts, no console output.
    #[arg(long)]
    pub autostart: bool,

    /// Relaunch in the background and return immediately.
    #[arg(long, conflicts_with = "autostart")]
    pub detach: bool,
}

impl RunArgs {
    pub fn run(self, log_json: bool) -> Result<()> {
        if self.detach {
            let exe = std::env::current_exe().context("cannot locate the running executable")?;
            let pid = spawn_detached(&exe).context("failed to start background agent")?;
            println!("{} packmirror running in the background (pid {pid})", "✓".green());
            return Ok(());
        }

        let home = home()?;
        let sink = LogSink::open_at(
            &home,
            LogOptions {
                echo_stderr: !self.autostart,
                json: log_json,
            },
        )
        .context("failed to open app.log")?;

        let config = sink.scope(|| -> Result<_> {
            tracing::info!(autostart = self.autostart, "packmirror starting");
            if app_config::exists_at(&home) {
                return app_config::load_at(&home).context("failed to load configuration");
            }
            if self.autostart {
                let path = app_config::config_path_at(&home);
                tracing::error!(path = %path.display(), "config not found in autostart mode");
                bail!("config not found at {}; run `packmirror setup`", path.display());
            }
            tracing::info!("config not found, running first-time setup");
            let stdin = io::stdin();
            setup_interactive(&home, &mut stdin.lock(), &mut io::stdout())
        })?;

        let cycle = CycleConfig::from_app_config(&config, &home);
        let interactive = !self.autostart;
        let summary = runtime()?.block_on(async move {
            let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
            let dispatch = sink.dispatch().clone();

            let signal = {
                let shutdown = shutdown_tx.clone();
                tokio::spawn(
                    async move {
                        match tokio::signal::ctrl_c().await {
                            Ok(()) => {
                                tracing::info!("received ctrl-c, stopping after the current step");
                                let _ = shutdown.send(());
                            }
                            Err(err) => tracing::error!(error = %err, "ctrl-c handler failed"),
                        }
                    }
                    .with_subscriber(dispatch.clone()),
                )
            };

            let controller =
                CopyCycleController::new(cycle, platform_observer()).with_shutdown(shutdown_rx);
            let mut worker = tokio::spawn(controller.run().with_subscriber(dispatch));

            let finished = if interactive {
                tokio::select! {
                    _ = tokio::time::sleep(STARTUP_NOTICE_DELAY) => {
                        println!(
                            "{} packmirror is running. Press Ctrl-C to stop; details are in {}",
                            "✓".green(),
                            sink.path().display()
                        );
                        None
                    }
                    result = &mut worker => Some(result),
                }
            } else {
                None
            };
            let result = match finished {
                Some(result) => result,
                None => worker.await,
            };
            signal.abort();
            result
        });

        let summary = summary.context("copy cycle controller task failed")?;
        if interactive {
            println!(
                "packmirror stopped after {} checks and {} mirror passes",
                summary.checks, summary.cycles_mirrored
            );
        }
        Ok(())
    }
}
